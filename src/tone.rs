//! PWM parameters for a published frequency
//!
//! The buzzer controller drives the pin in mark-space PWM mode and picks the
//! tone by dividing the PWM base clock. These helpers reproduce that math so
//! tools can show what a published value will do to the buzzer.

use std::time::Duration;

/// Parse a frequency the way `scanf("%d")` would
///
/// Leading whitespace and a `+` sign are accepted, then the leading decimal
/// digits are taken and anything after them is ignored. Values that are
/// missing, zero, negative or do not fit a `u32` yield `None`.
pub fn parse_frequency(text: &str) -> Option<u32> {
    let text = text.trim_start();
    let text = text.strip_prefix('+').unwrap_or(text);
    let end = text
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(text.len());

    match text[..end].parse::<u32>() {
        Ok(0) | Err(_) => None,
        Ok(freq) => Some(freq),
    }
}

/// PWM peripheral settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PwmSettings {
    /// PWM base clock
    pub base_clock_hz: u32,
    /// Clock range (counts per cycle)
    pub range: u32,
    /// Fraction of the range the output is high
    pub duty_cycle: f64,
}

impl Default for PwmSettings {
    fn default() -> Self {
        Self {
            base_clock_hz: 19_200_000,
            range: 1024,
            duty_cycle: 0.5,
        }
    }
}

impl PwmSettings {
    /// Clock divisor producing `freq_hz`, never below 1
    pub fn clock_divisor(&self, freq_hz: u32) -> u32 {
        let denom = u64::from(freq_hz) * u64::from(self.range);
        if denom == 0 {
            return 1;
        }
        (u64::from(self.base_clock_hz) / denom).max(1) as u32
    }

    /// Compare value for the configured duty cycle
    pub fn duty_value(&self) -> u32 {
        (self.duty_cycle * f64::from(self.range)) as u32
    }

    /// Delay between PWM writes for `freq_hz`, at least 1 ms
    pub fn period(&self, freq_hz: u32) -> Duration {
        let ms = 1000u32.checked_div(freq_hz).unwrap_or(1).max(1);
        Duration::from_millis(u64::from(ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_frequency() {
        assert_eq!(parse_frequency("440"), Some(440));
        assert_eq!(parse_frequency("  1000"), Some(1000));
        assert_eq!(parse_frequency("+880"), Some(880));
        assert_eq!(parse_frequency("250Hz"), Some(250));
        assert_eq!(parse_frequency("0"), None);
        assert_eq!(parse_frequency("-5"), None);
        assert_eq!(parse_frequency("abc"), None);
        assert_eq!(parse_frequency(""), None);
        assert_eq!(parse_frequency("99999999999"), None);
    }

    #[test]
    fn test_pwm_settings() {
        let pwm = PwmSettings::default();
        assert_eq!(pwm.duty_value(), 512);
        assert_eq!(pwm.clock_divisor(1000), 18);
        assert_eq!(pwm.clock_divisor(440), 42);
        assert_eq!(pwm.clock_divisor(100_000), 1);
        assert_eq!(pwm.clock_divisor(0), 1);
        assert_eq!(pwm.period(100), Duration::from_millis(10));
        assert_eq!(pwm.period(5000), Duration::from_millis(1));
    }
}
