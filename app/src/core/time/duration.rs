#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct Duration {
    #[serde(with = "duration_format")]
    delegate: chrono::Duration,
}

impl Duration {
    fn new(delegate: chrono::Duration) -> Self {
        Self { delegate }
    }

    pub fn minutes(minutes: i64) -> Self {
        Self::new(chrono::Duration::minutes(minutes))
    }

    pub fn seconds(seconds: i64) -> Self {
        Self::new(chrono::Duration::seconds(seconds))
    }

    pub fn millis(millis: i64) -> Self {
        Self::new(chrono::Duration::milliseconds(millis))
    }

    pub fn as_millis(&self) -> i64 {
        self.delegate.num_milliseconds()
    }
}

impl std::ops::Add<Duration> for Duration {
    type Output = Duration;

    fn add(self, rhs: Duration) -> Self::Output {
        Self::new(self.delegate + rhs.delegate)
    }
}

impl std::fmt::Display for Duration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}ms", self.as_millis())
    }
}

//negative durations are clamped to zero
impl From<Duration> for std::time::Duration {
    fn from(val: Duration) -> Self {
        std::time::Duration::from_millis(val.delegate.num_milliseconds().max(0) as u64)
    }
}

mod duration_format {
    use iso8601_duration::Duration as Iso8601Duration;
    use serde::{Deserializer, Serializer, de::Visitor};

    // Serialize `chrono::Duration` to ISO 8601 string format (e.g., "PT15S")
    pub fn serialize<S>(duration: &chrono::TimeDelta, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let iso_string = super::from_chrono_duration(duration).to_string();
        serializer.serialize_str(&iso_string)
    }

    // Deserialize ISO 8601 string format to `chrono::Duration`
    pub fn deserialize<'de, D>(deserializer: D) -> Result<chrono::Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct DurationVisitor;

        impl Visitor<'_> for DurationVisitor {
            type Value = chrono::TimeDelta;

            fn expecting(&self, formatter: &mut core::fmt::Formatter) -> core::fmt::Result {
                formatter.write_str("a string representing an ISO 8601 duration (e.g., PT15S)")
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                let iso_duration = Iso8601Duration::parse(value)
                    .map_err(|e| E::custom(format!("Error parsing {} to duration: {:?}", value, e)))?;

                match iso_duration.to_chrono() {
                    Some(duration) => Ok(duration),
                    None => Err(E::custom(format!(
                        "Duration too long. Must not contain years and/or months. Received {}",
                        value
                    ))),
                }
            }
        }

        deserializer.deserialize_str(DurationVisitor)
    }
}

fn from_chrono_duration(duration: &chrono::Duration) -> iso8601_duration::Duration {
    let hours = duration.num_hours();
    let minutes = duration.num_minutes() - hours * 60;
    let seconds = (duration.num_milliseconds() - duration.num_minutes() * 60_000) as f32 / 1000.0;

    iso8601_duration::Duration::new(
        0.0, //years
        0.0, //months
        0.0, //days
        hours as f32,
        minutes as f32,
        seconds,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::t;

    #[test]
    fn test_serialize_duration() {
        let duration = t!(1 minutes) + t!(15 seconds);
        let serialized = serde_json::to_string(&duration).unwrap();
        assert_eq!(serialized, r#""PT1M15S""#);
    }

    #[test]
    fn test_deserialize_duration() {
        let duration = serde_json::from_str::<Duration>(r#""PT15S""#).unwrap();
        assert_eq!(duration, t!(15 seconds));
    }

    #[test]
    fn test_deserialize_rejects_months() {
        let duration = serde_json::from_str::<Duration>(r#""P1M""#);
        assert!(duration.is_err());
    }

    #[test]
    fn test_into_std_duration() {
        let duration: std::time::Duration = t!(200 millis).into();
        assert_eq!(duration, std::time::Duration::from_millis(200));
    }
}
