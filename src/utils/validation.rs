use crate::services::authoring_service::FieldError;
use validator::Validate;

/// Order in which quiz setting violations are reported.
const SETTINGS_ORDER: [&str; 3] = ["timeLimitMinutes", "passingPercentage", "maxAttempts"];

pub fn validate<T: Validate>(val: &T) -> Result<(), validator::ValidationErrors> {
    val.validate()
}

/// Flattens `validator` output into field errors named the way the wire
/// format names them, in a stable order.
pub fn settings_errors(errors: &validator::ValidationErrors) -> Vec<FieldError> {
    let mut out: Vec<FieldError> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            let field = camel_case(&field.to_string());
            errs.iter().map(move |e| {
                let message = e
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("{} is invalid ({})", field, e.code));
                FieldError::quiz(field.clone(), message)
            })
        })
        .collect();

    out.sort_by_key(|e| {
        SETTINGS_ORDER
            .iter()
            .position(|name| *name == e.field)
            .unwrap_or(SETTINGS_ORDER.len())
    });
    out
}

fn camel_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper = false;
    for c in name.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.push(c.to_ascii_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}
