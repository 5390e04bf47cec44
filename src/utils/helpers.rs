use chrono::{Local, TimeZone};

/// Convert a (possibly fractional) MIDI note number to its frequency in Hz
pub fn midi_to_freq(midi: f64) -> f64 {
    // A4 (note 69) is 440 Hz
    440.0 * 2.0f64.powf((midi - 69.0) / 12.0)
}

/// Convert decibels to a linear amplitude value
pub fn db_to_amplitude(db: f32) -> f32 {
    10.0f32.powf(db / 20.0)
}

/// Wall-clock time of day for an epoch-millisecond timestamp, in local time
pub fn format_clock(epoch_ms: i64) -> String {
    match Local.timestamp_millis_opt(epoch_ms).single() {
        Some(time) => time.format("%H:%M:%S").to_string(),
        None => String::from("--:--:--"),
    }
}

/// Current wall-clock time in epoch milliseconds
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a4_is_440() {
        assert!((midi_to_freq(69.0) - 440.0).abs() < 1e-9);
        assert!((midi_to_freq(57.0) - 220.0).abs() < 1e-9);
        assert!((midi_to_freq(81.0) - 880.0).abs() < 1e-9);
    }

    #[test]
    fn decibels_to_gain() {
        assert_eq!(db_to_amplitude(0.0), 1.0);
        assert!((db_to_amplitude(-20.0) - 0.1).abs() < 1e-6);
        assert!((db_to_amplitude(-10.0) - 0.316_227_8).abs() < 1e-5);
    }

    #[test]
    fn clock_has_hms_shape() {
        let text = format_clock(1_700_000_000_000);
        assert_eq!(text.len(), 8);
        assert_eq!(text.matches(':').count(), 2);
    }
}
