//! Keplerian mean-element propagation for the planets.
//!
//! The element table (semi-major axis, eccentricity, inclination, mean
//! longitude, longitude of perihelion, longitude of the ascending node, and
//! their per-century rates; J2000 ecliptic, epoch J2000.0) is loaded from
//! the ephemeris data directory. Propagation solves the Kepler equation and
//! rotates the orbital-plane position into heliocentric J2000 ecliptic
//! coordinates in astronomical units.

use std::collections::BTreeMap;

/// Table key for the Earth-Moon barycenter row.
pub const EMBARY_KEY: &str = "embary";

/// Planet rows required for a usable table.
pub const REQUIRED_ROWS: [&str; 9] = [
    EMBARY_KEY, "mercury", "venus", "mars", "jupiter", "saturn", "uranus", "neptune", "pluto",
];

/// One row of mean elements plus per-century rates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElementRow {
    pub a_au: f64,
    pub e: f64,
    pub i_deg: f64,
    pub l_deg: f64,
    pub peri_deg: f64,
    pub node_deg: f64,
    pub a_rate: f64,
    pub e_rate: f64,
    pub i_rate: f64,
    pub l_rate: f64,
    pub peri_rate: f64,
    pub node_rate: f64,
}

/// Parsed element table.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementsTable {
    rows: BTreeMap<String, ElementRow>,
}

impl ElementsTable {
    /// Parse the table from its text content.
    ///
    /// Lines starting with `#` and blank lines are skipped; every data line
    /// is `key` followed by 12 floats. All of [`REQUIRED_ROWS`] must be
    /// present.
    pub fn parse(content: &str) -> Result<Self, String> {
        let mut rows = BTreeMap::new();
        for (lineno, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let mut tokens = line.split_whitespace();
            let key = tokens
                .next()
                .ok_or_else(|| format!("line {}: missing key", lineno + 1))?
                .to_ascii_lowercase();
            let values: Vec<f64> = tokens
                .map(|t| t.parse::<f64>())
                .collect::<Result<_, _>>()
                .map_err(|_| format!("line {}: non-numeric element", lineno + 1))?;
            if values.len() != 12 {
                return Err(format!(
                    "line {}: expected 12 elements for '{key}', got {}",
                    lineno + 1,
                    values.len()
                ));
            }
            rows.insert(
                key,
                ElementRow {
                    a_au: values[0],
                    e: values[1],
                    i_deg: values[2],
                    l_deg: values[3],
                    peri_deg: values[4],
                    node_deg: values[5],
                    a_rate: values[6],
                    e_rate: values[7],
                    i_rate: values[8],
                    l_rate: values[9],
                    peri_rate: values[10],
                    node_rate: values[11],
                },
            );
        }
        for required in REQUIRED_ROWS {
            if !rows.contains_key(required) {
                return Err(format!("element table is missing '{required}'"));
            }
        }
        Ok(Self { rows })
    }

    /// Heliocentric J2000-ecliptic position in AU at `t` Julian centuries
    /// past J2000.0. `None` when the key is unknown.
    pub fn heliocentric(&self, key: &str, t_centuries: f64) -> Option<[f64; 3]> {
        let row = self.rows.get(key)?;
        Some(propagate(row, t_centuries))
    }
}

/// Propagate one element row to a heliocentric position.
fn propagate(row: &ElementRow, t: f64) -> [f64; 3] {
    let a = row.a_au + row.a_rate * t;
    let e = row.e + row.e_rate * t;
    let i = (row.i_deg + row.i_rate * t).to_radians();
    let l = row.l_deg + row.l_rate * t;
    let peri = row.peri_deg + row.peri_rate * t;
    let node = (row.node_deg + row.node_rate * t).to_radians();

    // Mean anomaly, wrapped to (-180°, 180°] before the Kepler solve.
    let m_deg = wrap_half_turn(l - peri);
    let e_anom = solve_kepler(m_deg.to_radians(), e);

    // Position in the orbital plane, perihelion on +x.
    let xp = a * (e_anom.cos() - e);
    let yp = a * (1.0 - e * e).sqrt() * e_anom.sin();

    let omega = (peri - (row.node_deg + row.node_rate * t)).to_radians();
    let (sin_w, cos_w) = omega.sin_cos();
    let (sin_o, cos_o) = node.sin_cos();
    let (sin_i, cos_i) = i.sin_cos();

    [
        (cos_w * cos_o - sin_w * sin_o * cos_i) * xp + (-sin_w * cos_o - cos_w * sin_o * cos_i) * yp,
        (cos_w * sin_o + sin_w * cos_o * cos_i) * xp + (-sin_w * sin_o + cos_w * cos_o * cos_i) * yp,
        (sin_w * sin_i) * xp + (cos_w * sin_i) * yp,
    ]
}

/// Wrap degrees to (-180, 180].
fn wrap_half_turn(deg: f64) -> f64 {
    let wrapped = deg.rem_euclid(360.0);
    if wrapped > 180.0 { wrapped - 360.0 } else { wrapped }
}

/// Solve `M = E - e sin E` for the eccentric anomaly, radians.
fn solve_kepler(m_rad: f64, e: f64) -> f64 {
    let mut e_anom = m_rad + e * m_rad.sin();
    for _ in 0..30 {
        let delta = (m_rad - (e_anom - e * e_anom.sin())) / (1.0 - e * e_anom.cos());
        e_anom += delta;
        if delta.abs() < 1e-13 {
            break;
        }
    }
    e_anom
}
