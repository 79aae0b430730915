//! The IOPGPS API is loose about numeric types: coordinates, battery levels and
//! IMEIs arrive as either JSON numbers or strings depending on the endpoint.

use serde::{Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum Raw {
    Float(f64),
    Text(String),
}

fn parse(raw: Option<Raw>) -> Option<f64> {
    match raw? {
        Raw::Float(v) => Some(v),
        Raw::Text(s) => s.trim().parse::<f64>().ok(),
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Integer(u64),
    Text(String),
}

/// Identifiers such as the IMEI, kept as text whichever way they were sent.
pub fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match RawId::deserialize(deserializer)? {
        RawId::Integer(v) => v.to_string(),
        RawId::Text(s) => s.trim().to_string(),
    })
}

pub fn optional_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Raw>::deserialize(deserializer)?;
    Ok(parse(raw).filter(|v| v.is_finite()))
}

pub fn optional_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Raw>::deserialize(deserializer)?;
    Ok(parse(raw).filter(|v| v.is_finite()).map(|v| v.round() as i64))
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Sample {
        #[serde(default, deserialize_with = "super::optional_f64")]
        lat: Option<f64>,
        #[serde(default, deserialize_with = "super::optional_i64")]
        battery: Option<i64>,
    }

    #[test]
    fn accepts_strings_and_numbers() {
        let s: Sample = serde_json::from_str(r#"{"lat":"22.543","battery":87}"#).unwrap();
        assert_eq!(s.lat, Some(22.543));
        assert_eq!(s.battery, Some(87));

        let s: Sample = serde_json::from_str(r#"{"lat":113.9,"battery":"45"}"#).unwrap();
        assert_eq!(s.lat, Some(113.9));
        assert_eq!(s.battery, Some(45));
    }

    #[derive(Deserialize)]
    struct Listed {
        #[serde(deserialize_with = "super::string_or_number")]
        imei: String,
    }

    #[test]
    fn ids_accept_numbers_and_strings() {
        let l: Listed = serde_json::from_str(r#"{"imei":863019175495698}"#).unwrap();
        assert_eq!(l.imei, "863019175495698");
        let l: Listed = serde_json::from_str(r#"{"imei":" 863019175495698 "}"#).unwrap();
        assert_eq!(l.imei, "863019175495698");
        assert!(serde_json::from_str::<Listed>(r#"{"imei":true}"#).is_err());
    }

    #[test]
    fn garbage_and_missing_become_none() {
        let s: Sample = serde_json::from_str(r#"{"lat":"","battery":null}"#).unwrap();
        assert_eq!(s.lat, None);
        assert_eq!(s.battery, None);

        let s: Sample = serde_json::from_str("{}").unwrap();
        assert_eq!(s.lat, None);
        assert_eq!(s.battery, None);
    }
}
