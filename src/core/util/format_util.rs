use chrono::{DateTime, Utc};

const BYTE_UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

pub struct FormatUtil;

impl FormatUtil {
    /// Cores as `1.5`, or milli-cores as `250m` below one core.
    #[inline]
    pub fn cpu(cores: f64) -> String {
        if cores >= 1.0 {
            format!("{:.1}", cores)
        } else {
            format!("{:.0}m", cores * 1000.0)
        }
    }

    /// 1024-based human size with one decimal.
    pub fn bytes(bytes: f64) -> String {
        if bytes <= 0.0 {
            return "0B".to_string();
        }

        let mut size = bytes;
        let mut unit = 0;
        while size >= 1024.0 && unit < BYTE_UNITS.len() - 1 {
            size /= 1024.0;
            unit += 1;
        }

        format!("{:.1}{}", size, BYTE_UNITS[unit])
    }

    #[inline]
    pub fn percent(value: f64) -> String {
        format!("{:.1}%", value)
    }

    /// Coarse age: days, else hours, else minutes.
    pub fn age(created_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
        let Some(created) = created_at else {
            return "Unknown".to_string();
        };

        let diff = now.signed_duration_since(created);
        if diff.num_days() > 0 {
            format!("{}d", diff.num_days())
        } else if diff.num_hours() > 0 {
            format!("{}h", diff.num_hours())
        } else {
            format!("{}m", diff.num_minutes().max(0))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn formats_cpu() {
        assert_eq!(FormatUtil::cpu(2.0), "2.0");
        assert_eq!(FormatUtil::cpu(0.25), "250m");
        assert_eq!(FormatUtil::cpu(0.0), "0m");
    }

    #[test]
    fn formats_bytes() {
        assert_eq!(FormatUtil::bytes(0.0), "0B");
        assert_eq!(FormatUtil::bytes(512.0), "512.0B");
        assert_eq!(FormatUtil::bytes(128.0 * 1024.0 * 1024.0), "128.0MB");
        assert_eq!(FormatUtil::bytes(1.5 * 1024.0 * 1024.0 * 1024.0), "1.5GB");
    }

    #[test]
    fn formats_age_in_coarse_units() {
        let now = Utc::now();
        assert_eq!(FormatUtil::age(Some(now - Duration::days(3) - Duration::hours(5)), now), "3d");
        assert_eq!(FormatUtil::age(Some(now - Duration::hours(7)), now), "7h");
        assert_eq!(FormatUtil::age(Some(now - Duration::minutes(12)), now), "12m");
        assert_eq!(FormatUtil::age(Some(now + Duration::minutes(2)), now), "0m");
        assert_eq!(FormatUtil::age(None, now), "Unknown");
    }
}
