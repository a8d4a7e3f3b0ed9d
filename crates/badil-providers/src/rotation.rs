//! Rotation policy — which credential gets used next.
//!
//! A pure decision function over a store snapshot: first available wins,
//! retired keys become eligible again once their provider's cooldown has
//! elapsed. `retired_at` is reinterpreted by the cooldown, never reset.

use chrono::{DateTime, Duration, Utc};
use tracing::warn;

use badil_core::types::{ApiKey, ProviderKind};

/// Hours a Groq key rests after retirement — their quotas reset daily.
const GROQ_COOLDOWN_HOURS: i64 = 24;

/// Calendar days a HuggingFace key rests — their quotas reset monthly.
const HF_COOLDOWN_DAYS: i64 = 30;

/// First eligible credential in listed order, or `None` when the pool is
/// exhausted. Deterministic given the same snapshot and `now`; no load
/// balancing across equally-available keys.
pub fn select_next(candidates: &[ApiKey], now: DateTime<Utc>) -> Option<ApiKey> {
    candidates.iter().find(|k| is_eligible(k, now)).cloned()
}

/// Cooldown test for a single credential. Boundary is inclusive: a key
/// retired exactly one cooldown ago is eligible again.
pub fn is_eligible(key: &ApiKey, now: DateTime<Utc>) -> bool {
    let Some(retired_at) = key.retired_at else {
        return true;
    };

    match key.provider {
        ProviderKind::Groq => now - retired_at >= Duration::hours(GROQ_COOLDOWN_HOURS),
        ProviderKind::HuggingFace => {
            // Calendar days, not elapsed hours — the provider resets
            // monthly quota at date boundaries.
            (now.date_naive() - retired_at.date_naive()).num_days() >= HF_COOLDOWN_DAYS
        }
        ProviderKind::Unknown => {
            warn!(
                key = %key.redacted(),
                "Retired credential has unrecognized provider kind; permanently excluded"
            );
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(provider: ProviderKind, secret: &str, retired_ago: Option<Duration>) -> ApiKey {
        let mut k = ApiKey::new(provider, secret, "some-model");
        k.retired_at = retired_ago.map(|ago| Utc::now() - ago);
        k
    }

    #[test]
    fn test_fresh_key_is_eligible() {
        assert!(is_eligible(&key(ProviderKind::Groq, "k", None), Utc::now()));
    }

    #[test]
    fn test_groq_cooldown_boundary() {
        let now = Utc::now();

        let just_under = key(
            ProviderKind::Groq,
            "k",
            Some(Duration::hours(24) - Duration::seconds(1)),
        );
        assert!(!is_eligible(&just_under, now));

        let mut exactly = key(ProviderKind::Groq, "k", None);
        exactly.retired_at = Some(now - Duration::hours(24));
        assert!(is_eligible(&exactly, now));

        let well_over = key(ProviderKind::Groq, "k", Some(Duration::hours(48)));
        assert!(is_eligible(&well_over, now));
    }

    #[test]
    fn test_hf_cooldown_counts_calendar_days() {
        // Fixed reference time to make day arithmetic deterministic.
        let now: DateTime<Utc> = "2026-08-30T12:00:00Z".parse().unwrap();

        let mut recent = ApiKey::new(ProviderKind::HuggingFace, "k", "m");
        recent.retired_at = Some("2026-08-02T00:00:00Z".parse().unwrap());
        assert!(!is_eligible(&recent, now)); // 28 days

        let mut boundary = ApiKey::new(ProviderKind::HuggingFace, "k", "m");
        boundary.retired_at = Some("2026-07-31T23:59:00Z".parse().unwrap());
        assert!(is_eligible(&boundary, now)); // exactly 30 calendar days

        let mut old = ApiKey::new(ProviderKind::HuggingFace, "k", "m");
        old.retired_at = Some("2026-06-01T00:00:00Z".parse().unwrap());
        assert!(is_eligible(&old, now));
    }

    #[test]
    fn test_unknown_kind_permanently_excluded_once_retired() {
        let now = Utc::now();
        assert!(is_eligible(&key(ProviderKind::Unknown, "k", None), now));
        assert!(!is_eligible(
            &key(ProviderKind::Unknown, "k", Some(Duration::days(365))),
            now
        ));
    }

    #[test]
    fn test_first_available_wins() {
        let pool = vec![
            key(ProviderKind::Groq, "a", Some(Duration::hours(1))),
            key(ProviderKind::Groq, "b", None),
            key(ProviderKind::Groq, "c", None),
        ];
        let picked = select_next(&pool, Utc::now()).unwrap();
        assert_eq!(picked.secret, "b");
    }

    #[test]
    fn test_selection_is_deterministic() {
        let now = Utc::now();
        let pool = vec![
            key(ProviderKind::Groq, "a", Some(Duration::hours(30))),
            key(ProviderKind::Groq, "b", None),
        ];
        let first = select_next(&pool, now).unwrap();
        let second = select_next(&pool, now).unwrap();
        // Cooldown elapsed on "a", so it wins both times.
        assert_eq!(first.secret, "a");
        assert_eq!(first, second);
    }

    #[test]
    fn test_exhausted_pool_returns_none() {
        let pool = vec![
            key(ProviderKind::Groq, "a", Some(Duration::hours(1))),
            key(ProviderKind::HuggingFace, "b", Some(Duration::days(2))),
        ];
        assert!(select_next(&pool, Utc::now()).is_none());
    }

    #[test]
    fn test_empty_pool_returns_none() {
        assert!(select_next(&[], Utc::now()).is_none());
    }
}
