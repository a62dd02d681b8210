//! Scripted plucks for headless and demo runs.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tensile_core::{Point, Scene, StringInstance};

/// How long a scripted pluck holds the string before letting go.
pub const DEFAULT_HOLD_MS: u64 = 100;

fn default_hold_ms() -> u64 {
  DEFAULT_HOLD_MS
}

/// Grab string `string` at `fraction` of its length, pull it `offset` pixels
/// down the screen (negative pulls up), and release after `hold_ms`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pluck {
  pub string: usize,
  pub fraction: f64,
  pub offset: f64,
  #[serde(default)]
  pub at_ms: u64,
  #[serde(default = "default_hold_ms")]
  pub hold_ms: u64,
}

impl Pluck {
  pub fn new(string: usize, fraction: f64, offset: f64) -> Self {
    Self {
      string,
      fraction,
      offset,
      at_ms: 0,
      hold_ms: DEFAULT_HOLD_MS,
    }
  }

  pub fn at(mut self, at_ms: u64) -> Self {
    self.at_ms = at_ms;
    self
  }

  /// Pointer position that produces this pluck on `string`.
  pub fn pointer(&self, string: &StringInstance) -> Point {
    let baseline = string.baseline();
    baseline
      .start
      .lerp(baseline.end, self.fraction.clamp(0.0, 1.0))
      + Point::new(0.0, self.offset)
  }

  pub fn release_ms(&self) -> u64 {
    self.at_ms + self.hold_ms
  }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PluckParseError {
  /// Fewer than three `:`-separated fields
  MissingField(String),
  /// A field is not a number
  InvalidNumber { field: &'static str, value: String },
}

impl std::fmt::Display for PluckParseError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      PluckParseError::MissingField(input) => {
        write!(f, "expected STRING:FRACTION:OFFSET[@MS], got '{}'", input)
      }
      PluckParseError::InvalidNumber { field, value } => {
        write!(f, "invalid {}: '{}'", field, value)
      }
    }
  }
}

impl std::error::Error for PluckParseError {}

fn parse_field<T: FromStr>(field: &'static str, value: &str) -> Result<T, PluckParseError> {
  value
    .trim()
    .parse()
    .map_err(|_| PluckParseError::InvalidNumber {
      field,
      value: value.to_string(),
    })
}

fn parse_finite(field: &'static str, value: &str) -> Result<f64, PluckParseError> {
  let number: f64 = parse_field(field, value)?;
  if number.is_finite() {
    Ok(number)
  } else {
    Err(PluckParseError::InvalidNumber {
      field,
      value: value.to_string(),
    })
  }
}

/// `STRING:FRACTION:OFFSET[@MS]`, e.g. `3:0.5:40@250`.
impl FromStr for Pluck {
  type Err = PluckParseError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let (body, at) = match s.split_once('@') {
      Some((body, at)) => (body, Some(at)),
      None => (s, None),
    };

    let mut fields = body.split(':');
    let (Some(string), Some(fraction), Some(offset), None) =
      (fields.next(), fields.next(), fields.next(), fields.next())
    else {
      return Err(PluckParseError::MissingField(s.to_string()));
    };

    let mut pluck = Pluck::new(
      parse_field("string", string)?,
      parse_finite("fraction", fraction)?,
      parse_finite("offset", offset)?,
    );
    if let Some(at) = at {
      pluck.at_ms = parse_field("time", at)?;
    }
    Ok(pluck)
  }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PluckAction {
  Hold(Pluck),
  Release(usize),
}

/// Actions whose time falls in `[from_ms, to_ms)`: holds first, then releases.
pub fn actions_between(plucks: &[Pluck], from_ms: u64, to_ms: u64) -> Vec<PluckAction> {
  let in_window = |t: u64| t >= from_ms && t < to_ms;
  let holds = plucks
    .iter()
    .filter(|p| in_window(p.at_ms))
    .map(|p| PluckAction::Hold(*p));
  let releases = plucks
    .iter()
    .filter(|p| in_window(p.release_ms()))
    .map(|p| PluckAction::Release(p.string));
  holds.chain(releases).collect()
}

/// Apply actions to the scene. Actions naming a missing string are skipped.
pub fn apply(scene: &Scene, actions: &[PluckAction]) {
  for action in actions {
    match *action {
      PluckAction::Hold(pluck) => {
        let Some(string) = scene.strings().get(pluck.string) else {
          tracing::warn!(string = pluck.string, "pluck names a missing string");
          continue;
        };
        let mut string = string.lock();
        let pointer = pluck.pointer(&string);
        let outcome = string.hold(pointer);
        tracing::debug!(
          string = pluck.string,
          segment = outcome.nearest_id,
          distance = outcome.distance,
          "scripted hold"
        );
      }
      PluckAction::Release(index) => {
        if let Some(string) = scene.strings().get(index) {
          string.lock().let_go();
        }
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_parse_pluck() {
    let pluck: Pluck = "3:0.5:40".parse().unwrap();
    assert_eq!(pluck, Pluck::new(3, 0.5, 40.0));

    let pluck: Pluck = "0:0.25:-12.5@250".parse().unwrap();
    assert_eq!(pluck, Pluck::new(0, 0.25, -12.5).at(250));
  }

  #[test]
  fn test_parse_pluck_errors() {
    assert!(matches!(
      "3:0.5".parse::<Pluck>(),
      Err(PluckParseError::MissingField(_))
    ));
    assert!(matches!(
      "3:0.5:1:2".parse::<Pluck>(),
      Err(PluckParseError::MissingField(_))
    ));
    assert_eq!(
      "x:0.5:1".parse::<Pluck>(),
      Err(PluckParseError::InvalidNumber {
        field: "string",
        value: "x".to_string()
      })
    );
    assert_eq!(
      "0:nan:30".parse::<Pluck>(),
      Err(PluckParseError::InvalidNumber {
        field: "fraction",
        value: "nan".to_string()
      })
    );
    assert!(matches!(
      "0:0.5:inf".parse::<Pluck>(),
      Err(PluckParseError::InvalidNumber { field: "offset", .. })
    ));
  }

  #[test]
  fn test_actions_between() {
    let plucks = [Pluck::new(0, 0.5, 30.0).at(10), Pluck::new(1, 0.5, 30.0).at(40)];
    assert_eq!(actions_between(&plucks, 0, 16), vec![PluckAction::Hold(plucks[0])]);
    assert!(actions_between(&plucks, 16, 32).is_empty());
    assert_eq!(actions_between(&plucks, 32, 48), vec![PluckAction::Hold(plucks[1])]);
    assert_eq!(actions_between(&plucks, 96, 112), vec![PluckAction::Release(0)]);
  }

  #[test]
  fn test_pluck_deserializes_with_defaults() {
    let pluck: Pluck =
      serde_json::from_str(r#"{ "string": 2, "fraction": 0.1, "offset": 5.0 }"#).unwrap();
    assert_eq!(pluck, Pluck::new(2, 0.1, 5.0));

    let pluck: Pluck = serde_json::from_str(
      r#"{ "string": 2, "fraction": 0.1, "offset": 5.0, "atMs": 300, "holdMs": 20 }"#,
    )
    .unwrap();
    assert_eq!(pluck.at_ms, 300);
    assert_eq!(pluck.release_ms(), 320);
  }
}
