//! Kubernetes quantity strings → canonical floats (cores for CPU, bytes for memory).

/// Suffix table ordered longest-first so `Mi` wins over `M` and `m`.
const SUFFIXES: &[(&str, f64)] = &[
    ("Ki", 1024.0),
    ("Mi", 1_048_576.0),
    ("Gi", 1_073_741_824.0),
    ("Ti", 1_099_511_627_776.0),
    ("Pi", 1_125_899_906_842_624.0),
    ("Ei", 1_152_921_504_606_846_976.0),
    ("k", 1e3),
    ("K", 1e3),
    ("M", 1e6),
    ("G", 1e9),
    ("T", 1e12),
    ("P", 1e15),
    ("E", 1e18),
    ("m", 1e-3),
    ("u", 1e-6),
    ("n", 1e-9),
];

/// Parse a quantity such as `"500m"`, `"128Mi"` or `"2"`.
///
/// Total: empty or malformed input yields `0.0`, never an error, so one bad
/// field cannot blank out a whole node or pod record.
pub fn parse_quantity(raw: &str) -> f64 {
    let s = raw.trim();
    if s.is_empty() {
        return 0.0;
    }

    // Milli-CPU fast path ("250m")
    if let Some(prefix) = s.strip_suffix('m') {
        if !prefix.is_empty() && prefix.bytes().all(|b| b.is_ascii_digit()) {
            return finite_or_zero(prefix.parse::<f64>().unwrap_or(0.0) * 0.001);
        }
    }

    for (suffix, multiplier) in SUFFIXES {
        if let Some(number) = s.strip_suffix(suffix) {
            return match number.parse::<f64>() {
                Ok(v) => finite_or_zero(v * multiplier),
                Err(_) => 0.0,
            };
        }
    }

    s.parse::<f64>().map(finite_or_zero).unwrap_or(0.0)
}

/// Parse an optional quantity; absence is a zero contribution.
#[inline]
pub fn parse_optional_quantity(raw: Option<&str>) -> f64 {
    raw.map(parse_quantity).unwrap_or(0.0)
}

fn finite_or_zero(v: f64) -> f64 {
    if v.is_finite() && v >= 0.0 {
        v
    } else {
        0.0
    }
}
