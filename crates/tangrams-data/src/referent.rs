//! Candidate referents of a round.

use serde::{Deserialize, Serialize};

/// One candidate shape in a round.
///
/// Colors are normalized to \[0, 1\]; positions are normalized screen coordinates in
/// \[0, 1\]. The center-distance features `midx`/`midy` are derived from the position and
/// are only ever written by [`Referent::set_pos`], so they cannot drift out of sync.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "ReferentRecord", into = "ReferentRecord")]
pub struct Referent {
    pub id: u32,
    /// Number of the round this referent belongs to.
    pub round: i32,
    pub shape: String,
    pub size: f64,
    pub red: f64,
    pub green: f64,
    pub blue: f64,
    pub hue: f64,
    /// How often the referent was mentioned; filled in by the loader.
    pub mentioned: u32,
    target: bool,
    posx: f64,
    posy: f64,
    midx: f64,
    midy: f64,
}

impl Referent {
    /// Creates a non-target referent at the center of the board with black color.
    #[must_use]
    pub fn new<S>(id: u32, round: i32, shape: S) -> Self
    where
        S: Into<String>,
    {
        let mut referent = Self {
            id,
            round,
            shape: shape.into(),
            size: 0.0,
            red: 0.0,
            green: 0.0,
            blue: 0.0,
            hue: 0.0,
            mentioned: 0,
            target: false,
            posx: 0.0,
            posy: 0.0,
            midx: 0.0,
            midy: 0.0,
        };
        referent.set_pos(0.5, 0.5);
        referent
    }

    #[must_use]
    pub fn with_size(mut self, size: f64) -> Self {
        self.size = size;
        self
    }

    #[must_use]
    pub fn with_color(mut self, red: f64, green: f64, blue: f64) -> Self {
        self.red = red;
        self.green = green;
        self.blue = blue;
        self
    }

    #[must_use]
    pub fn with_pos(mut self, x: f64, y: f64) -> Self {
        self.set_pos(x, y);
        self
    }

    #[must_use]
    pub fn with_target(mut self, target: bool) -> Self {
        self.target = target;
        self
    }

    /// Sets the position and recomputes the center-distance features.
    pub fn set_pos(&mut self, x: f64, y: f64) {
        self.posx = x;
        self.posy = y;
        self.midx = mid(x);
        self.midy = mid(y);
    }

    #[must_use]
    pub fn is_target(&self) -> bool {
        self.target
    }

    #[must_use]
    pub fn posx(&self) -> f64 {
        self.posx
    }

    #[must_use]
    pub fn posy(&self) -> f64 {
        self.posy
    }

    /// Horizontal closeness to the center: 1 at the center, 0 at either edge.
    #[must_use]
    pub fn midx(&self) -> f64 {
        self.midx
    }

    /// Vertical closeness to the center: 1 at the center, 0 at either edge.
    #[must_use]
    pub fn midy(&self) -> f64 {
        self.midy
    }
}

fn mid(pos: f64) -> f64 {
    1.0 - (0.5 - pos).abs() * 2.0
}

/// Serialized form; the derived center-distance features are not stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ReferentRecord {
    id: u32,
    round: i32,
    shape: String,
    size: f64,
    red: f64,
    green: f64,
    blue: f64,
    #[serde(default)]
    hue: f64,
    posx: f64,
    posy: f64,
    #[serde(default)]
    mentioned: u32,
    #[serde(default)]
    target: bool,
}

impl From<ReferentRecord> for Referent {
    fn from(record: ReferentRecord) -> Self {
        let mut referent = Referent::new(record.id, record.round, record.shape)
            .with_size(record.size)
            .with_color(record.red, record.green, record.blue)
            .with_target(record.target);
        referent.hue = record.hue;
        referent.mentioned = record.mentioned;
        referent.set_pos(record.posx, record.posy);
        referent
    }
}

impl From<Referent> for ReferentRecord {
    fn from(referent: Referent) -> Self {
        Self {
            id: referent.id,
            round: referent.round,
            shape: referent.shape,
            size: referent.size,
            red: referent.red,
            green: referent.green,
            blue: referent.blue,
            hue: referent.hue,
            posx: referent.posx,
            posy: referent.posy,
            mentioned: referent.mentioned,
            target: referent.target,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mid_invariant_after_set_pos() {
        let positions = [0.0, 0.1, 0.25, 0.5, 0.73, 0.999, 1.0];
        let mut referent = Referent::new(1, 1, "wedge");
        for &x in &positions {
            for &y in &positions {
                referent.set_pos(x, y);
                assert_eq!(referent.midx(), 1.0 - (0.5 - x).abs() * 2.0);
                assert_eq!(referent.midy(), 1.0 - (0.5 - y).abs() * 2.0);
            }
        }
    }

    #[test]
    fn test_mid_extremes() {
        let center = Referent::new(1, 1, "wedge").with_pos(0.5, 0.5);
        assert_eq!((center.midx(), center.midy()), (1.0, 1.0));
        let corner = Referent::new(2, 1, "wedge").with_pos(0.0, 1.0);
        assert_eq!((corner.midx(), corner.midy()), (0.0, 0.0));
    }

    #[test]
    fn test_deserialize_recomputes_mid() {
        let json = r#"{
            "id": 7, "round": 3, "shape": "heart", "size": 0.5,
            "red": 1.0, "green": 0.0, "blue": 0.0,
            "posx": 0.25, "posy": 0.75, "target": true,
            "midx": 123.0
        }"#;
        let referent: Referent = serde_json::from_str(json).unwrap();
        assert!(referent.is_target());
        assert_eq!(referent.midx(), 0.5);
        assert_eq!(referent.midy(), 0.5);

        let serialized = serde_json::to_value(&referent).unwrap();
        assert!(serialized.get("midx").is_none());
        assert_eq!(serialized["posx"], 0.25);
    }
}
