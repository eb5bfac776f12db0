#[macro_export]
macro_rules! t {
    ($amount:literal millis) => {{
        $crate::core::time::Duration::millis($amount)
    }};
    ($amount:literal seconds) => {{
        $crate::core::time::Duration::seconds($amount)
    }};
    ($amount:literal minutes) => {{
        $crate::core::time::Duration::minutes($amount)
    }};
}

#[cfg(test)]
mod tests {
    use crate::core::time::*;

    #[test]
    fn test_duration_millis() {
        let duration = t!(500 millis);

        assert_eq!(duration.as_millis(), 500);
    }

    #[test]
    fn test_duration_seconds() {
        let duration = t!(10 seconds);

        assert_eq!(duration.as_millis(), 10_000);
    }

    #[test]
    fn test_duration_minutes() {
        let duration = t!(2 minutes);

        assert_eq!(duration.as_millis(), 120_000);
    }
}
