//! 配置校验
//!
//! 规则：
//! - blueprint 类型上声明的字段约束 (`validator` derive)
//! - 区间边界可解析，`end >= start`，且跨度小于一天
//! - broker URL 的 scheme 受支持，且有主机名和合法端口
//! - topic 前缀是普通 MQTT topic 名（不含通配符，不以 `/` 结尾）

use contracts::{BrokerAddress, ContractError, ReplayBlueprint};
use validator::{Validate, ValidationErrors, ValidationErrorsKind};

/// 校验 ReplayBlueprint
///
/// 返回遇到的第一个错误，否则 Ok(())。
pub fn validate(blueprint: &ReplayBlueprint) -> Result<(), ContractError> {
    validate_fields(blueprint)?;
    validate_interval(blueprint)?;
    validate_broker(blueprint)?;
    validate_topic_prefix(blueprint)?;
    Ok(())
}

/// 声明式约束（范围、长度）
fn validate_fields(blueprint: &ReplayBlueprint) -> Result<(), ContractError> {
    blueprint.validate().map_err(|errors| {
        let (field, message) = first_error(&errors, "")
            .unwrap_or_else(|| ("<root>".to_string(), errors.to_string()));
        ContractError::config_validation(field, message)
    })
}

/// 深度优先、按键排序，保证报告的字段稳定
fn first_error(errors: &ValidationErrors, prefix: &str) -> Option<(String, String)> {
    let mut entries: Vec<_> = errors.errors().iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));

    entries.into_iter().find_map(|(name, kind)| {
        let path = if prefix.is_empty() {
            name.to_string()
        } else {
            format!("{prefix}.{name}")
        };
        match kind {
            ValidationErrorsKind::Field(list) => list.first().map(|e| {
                let message = match &e.message {
                    Some(message) => message.to_string(),
                    None => format!("failed '{}' constraint", e.code),
                };
                (path, message)
            }),
            ValidationErrorsKind::Struct(inner) => first_error(inner, &path),
            ValidationErrorsKind::List(items) => items
                .iter()
                .find_map(|(idx, inner)| first_error(inner, &format!("{path}[{idx}]"))),
        }
    })
}

fn validate_interval(blueprint: &ReplayBlueprint) -> Result<(), ContractError> {
    blueprint
        .source
        .interval
        .to_interval()
        .map(|_| ())
        .map_err(|e| ContractError::config_validation("source.interval", e.to_string()))
}

fn validate_broker(blueprint: &ReplayBlueprint) -> Result<(), ContractError> {
    BrokerAddress::parse(&blueprint.sink.broker).map(|_| ())
}

fn validate_topic_prefix(blueprint: &ReplayBlueprint) -> Result<(), ContractError> {
    let prefix = &blueprint.sink.topic_prefix;

    if prefix.contains(['+', '#']) {
        return Err(ContractError::config_validation(
            "sink.topic_prefix",
            format!("'{prefix}' must not contain MQTT wildcards"),
        ));
    }
    if prefix.ends_with('/') {
        return Err(ContractError::config_validation(
            "sink.topic_prefix",
            format!("'{prefix}' must not end with '/'"),
        ));
    }
    if prefix.contains('\0') {
        return Err(ContractError::config_validation(
            "sink.topic_prefix",
            "must not contain NUL characters",
        ));
    }
    Ok(())
}
