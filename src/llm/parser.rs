use crate::error::{EnrichError, Result};
use crate::schema::CompanyRecord;
use serde_json::Value;

/// Parses the extraction response into a `CompanyRecord`.
///
/// Text that is not JSON is a `Format` error. JSON that does not match the schema
/// (missing field, wrong type, unknown enum value, out-of-range number) is a
/// `Validation` error. Unknown extra fields are ignored.
pub fn parse_company_record(raw: &str, company: &str) -> Result<CompanyRecord> {
    let cleaned = clean_json_output(raw);
    let value: Value = serde_json::from_str(&cleaned).map_err(|e| {
        EnrichError::Format(format!("Response for '{}' is not valid JSON: {}", company, e))
    })?;

    let value = unwrap_company_key(value, company);
    if !value.is_object() {
        return Err(EnrichError::Validation(format!(
            "Response for '{}' is not a JSON object",
            company
        )));
    }

    let record: CompanyRecord = serde_json::from_value(value).map_err(|e| {
        EnrichError::Validation(format!("Response for '{}' does not match the schema: {}", company, e))
    })?;
    record.validate()?;
    Ok(record)
}

/// Accepts `{"<company>": {...}}`, the shape the few-shot example demonstrates.
fn unwrap_company_key(value: Value, company: &str) -> Value {
    match value {
        Value::Object(mut map) if map.len() == 1 && map.get(company).is_some_and(Value::is_object) => {
            map.remove(company).unwrap_or_default()
        }
        other => other,
    }
}

/// Picks the JSON payload out of a reply that may wrap it in a code fence or prose.
///
/// A fenced block wins. Otherwise a reply that opens with `[` is taken whole, and
/// anything else is read as one value starting at the first `{`, ignoring what
/// follows it.
fn clean_json_output(raw: &str) -> String {
    let text = fenced_body(raw).unwrap_or(raw).trim();
    if text.starts_with('[') {
        return text.to_string();
    }

    if let Some(start) = text.find('{') {
        let mut values = serde_json::Deserializer::from_str(&text[start..]).into_iter::<Value>();
        if let Some(Ok(_)) = values.next() {
            return text[start..start + values.byte_offset()].to_string();
        }
        return text[start..].to_string();
    }
    text.to_string()
}

/// Body of the first ```` ``` ```` block, minus its language tag.
fn fenced_body(raw: &str) -> Option<&str> {
    let (_, after_open) = raw.split_once("```")?;
    let body = match after_open.split_once('\n') {
        Some((tag, rest)) if !tag.trim_start().starts_with(['{', '[']) => rest,
        _ => after_open,
    };
    let (body, _) = body.split_once("```")?;
    Some(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid() -> Value {
        json!({
            "Sectors": ["Industrials"],
            "IndustryGroups": ["Capital Goods"],
            "Location": "Phoenix, Arizona",
            "GeographicScope": "National",
            "YearFounded": 1949,
            "Size": 350,
            "PublicPrivate": "Private",
            "ProductServiceType": "Physical",
            "CustomerSegment": ["B2C"],
            "Revenue": 75000000.0,
            "Competitors": ["Globex", "Initech", "Umbrella", "Hooli", "Stark Industries"],
            "MarketShares": {"Anvils": "20-25%"}
        })
    }

    #[test]
    fn test_parse_plain_json() {
        let record = parse_company_record(&valid().to_string(), "Acme Corp").unwrap();
        assert_eq!(record.location, "Phoenix, Arizona");
    }

    #[test]
    fn test_parse_fenced_json_with_prose() {
        let raw = format!(
            "Here is the result:\n```json\n{}\n```\nLet me know if you need more.",
            serde_json::to_string_pretty(&valid()).unwrap()
        );
        assert!(parse_company_record(&raw, "Acme Corp").is_ok());
    }

    #[test]
    fn test_braces_in_prose_around_fence() {
        let body = serde_json::to_string_pretty(&valid()).unwrap();

        let raw = format!("```json\n{}\n```\nNote: revenue is in {{USD}}.", body);
        assert_eq!(parse_company_record(&raw, "Acme Corp").unwrap().size, 350);

        let raw = format!("Based on the {{analysis}} above:\n```json\n{}\n```", body);
        assert_eq!(parse_company_record(&raw, "Acme Corp").unwrap().size, 350);

        let raw = format!("```\n{}\n```", body);
        assert!(parse_company_record(&raw, "Acme Corp").is_ok());
    }

    #[test]
    fn test_unfenced_json_with_trailing_prose() {
        let raw = format!("{} Revenue is in {{USD}}.", valid());
        assert!(parse_company_record(&raw, "Acme Corp").is_ok());
    }

    #[test]
    fn test_parse_wrapped_in_company_key() {
        let raw = json!({ "Acme Corp": valid() }).to_string();
        let record = parse_company_record(&raw, "Acme Corp").unwrap();
        assert_eq!(record.size, 350);

        // a wrapper under some other name is not unwrapped
        let raw = json!({ "Globex": valid() }).to_string();
        assert!(matches!(
            parse_company_record(&raw, "Acme Corp"),
            Err(EnrichError::Validation(_))
        ));
    }

    #[test]
    fn test_extra_fields_are_accepted() {
        let mut value = valid();
        value["CEO"] = json!("Wile E. Coyote");
        value["Ticker"] = json!(null);
        assert!(parse_company_record(&value.to_string(), "Acme Corp").is_ok());
    }

    #[test]
    fn test_missing_field_is_validation_error() {
        let mut value = valid();
        value.as_object_mut().unwrap().remove("MarketShares");
        match parse_company_record(&value.to_string(), "Acme Corp") {
            Err(EnrichError::Validation(msg)) => assert!(msg.contains("MarketShares")),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_range_violation_is_validation_error() {
        let mut value = valid();
        value["Sectors"] = json!([]);
        assert!(matches!(
            parse_company_record(&value.to_string(), "Acme Corp"),
            Err(EnrichError::Validation(_))
        ));
    }

    #[test]
    fn test_non_json_is_format_error() {
        assert!(matches!(
            parse_company_record("I could not find that company.", "Acme Corp"),
            Err(EnrichError::Format(_))
        ));
        assert!(matches!(
            parse_company_record("{\"Sectors\": [", "Acme Corp"),
            Err(EnrichError::Format(_))
        ));
    }

    #[test]
    fn test_json_array_is_validation_error() {
        assert!(matches!(
            parse_company_record("[1, 2, 3]", "Acme Corp"),
            Err(EnrichError::Validation(_))
        ));
        assert!(matches!(
            parse_company_record(&format!("[{}]", valid()), "Acme Corp"),
            Err(EnrichError::Validation(_))
        ));
        assert!(matches!(
            parse_company_record(&format!("```json\n[{}]\n```", valid()), "Acme Corp"),
            Err(EnrichError::Validation(_))
        ));
    }
}
