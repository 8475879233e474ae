//! Canonical input fingerprint.
//!
//! The fingerprint identifies a reproducible computation: it hashes the
//! prepared input plus every engine option that influences the payload —
//! and nothing else, so reference/ruleset upgrades keep the hash stable.
//! Canonical form: sorted `key=value` lines, floats in fixed `%.9f`
//! notation, absent options rendered as `n/a`.

use std::collections::BTreeMap;

use sha2::{Digest, Sha256};

use astra_chart::NatalResult;

/// 64-hex lower-case SHA-256 of the canonicalized prepared input + options.
pub fn input_fingerprint(result: &NatalResult) -> String {
    let lines = canonical_lines(result);
    let mut hasher = Sha256::new();
    for (key, value) in &lines {
        hasher.update(key.as_bytes());
        hasher.update(b"=");
        hasher.update(value.as_bytes());
        hasher.update(b"\n");
    }
    hex::encode(hasher.finalize())
}

fn canonical_lines(result: &NatalResult) -> BTreeMap<&'static str, String> {
    let prepared = &result.prepared_input;
    let mut lines = BTreeMap::new();

    lines.insert("birth_datetime_local", prepared.birth_datetime_local.clone());
    lines.insert("birth_datetime_utc", prepared.birth_datetime_utc.clone());
    lines.insert("timestamp_utc", prepared.timestamp_utc.to_string());
    lines.insert("jd_ut", canonical_f64(prepared.jd_ut));
    lines.insert("timezone_iana", prepared.timezone_iana.clone());
    lines.insert(
        "timezone_source",
        match prepared.timezone_source {
            astra_chart::TimezoneSource::UserProvided => "user_provided".into(),
            astra_chart::TimezoneSource::Derived => "derived".into(),
        },
    );
    lines.insert("time_scale", prepared.time_scale.as_str().into());
    lines.insert(
        "delta_t_sec",
        prepared.delta_t_sec.map_or_else(|| "n/a".into(), canonical_f64),
    );
    lines.insert(
        "jd_tt",
        prepared.jd_tt.map_or_else(|| "n/a".into(), canonical_f64),
    );

    lines.insert("engine", result.engine.as_str().into());
    lines.insert("zodiac", result.zodiac.as_str().into());
    lines.insert(
        "ayanamsa",
        result.ayanamsa.map_or("n/a", |a| a.as_str()).into(),
    );
    lines.insert("frame", result.frame.as_str().into());
    lines.insert("house_system", result.house_system.as_str().into());
    lines.insert(
        "altitude_m",
        result.altitude_m.map_or_else(|| "n/a".into(), canonical_f64),
    );
    lines.insert("aspect_school", result.aspect_school.as_str().into());

    lines
}

/// Fixed float rendering so equal values always hash equally.
fn canonical_f64(value: f64) -> String {
    format!("{value:.9}")
}
