//! Scene resolution: filter, bind, then shape the result for the scene's
//! visualization type.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum::{AsRefStr, Display, EnumString};

use super::{
  Record,
  binding::{DataBinding, ResolvedBinding, resolve_data_binding},
  filter::{Filter, apply_filter},
};

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum VisualizationKind {
  Counter,
  HumanScale,
  DotGrid,
  IconGrid,
  UnitGrid,
  BarChart,
  PieChart,
  DonutChart,
  LineChart,
  Treemap,
  /// Text-only or presentational scenes; config passes through untouched.
  #[serde(other)]
  Other,
}

impl VisualizationKind {
  pub fn takes_value(self) -> bool { matches!(self, Self::Counter | Self::HumanScale) }

  pub fn is_grid(self) -> bool { matches!(self, Self::DotGrid | Self::IconGrid | Self::UnitGrid) }

  pub fn is_chart(self) -> bool {
    matches!(
      self,
      Self::BarChart | Self::PieChart | Self::DonutChart | Self::LineChart | Self::Treemap
    )
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Visualization {
  #[serde(rename = "type")]
  pub kind:   VisualizationKind,
  #[serde(default)]
  pub config: Map<String, Value>,
}

/// One step of a scrollytelling narrative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scene {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub id:             Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub filter_records: Option<Filter>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub data_binding:   Option<DataBinding>,
  pub visualization:  Visualization,
}

/// A scene with its binding resolved and values injected into the config.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedScene<'a> {
  pub visualization: VisualizationKind,
  pub config:        Map<String, Value>,
  /// The scene's record set after `filterRecords`.
  pub records:       Vec<&'a Record>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub binding:       Option<ResolvedBinding<'a>>,
}

/// Narrow `records` by the scene filter, resolve the binding over what
/// remains, and inject the result into the visualization config.
pub fn resolve_scene<'a, I>(scene: &Scene, records: I) -> ResolvedScene<'a>
where
  I: IntoIterator<Item = &'a Record>,
{
  let records: Vec<&'a Record> = match &scene.filter_records {
    Some(filter) => apply_filter(records, filter),
    None => records.into_iter().collect(),
  };
  let binding = scene
    .data_binding
    .as_ref()
    .map(|b| resolve_data_binding(b, records.iter().copied()));

  let kind = scene.visualization.kind;
  let mut config = scene.visualization.config.clone();
  if let Some(resolved) = &binding {
    inject(kind, &mut config, resolved);
  }

  ResolvedScene { visualization: kind, config, records, binding }
}

fn inject(kind: VisualizationKind, config: &mut Map<String, Value>, resolved: &ResolvedBinding<'_>) {
  if kind.takes_value() {
    config.insert("value".into(), number_value(resolved.as_number()));
  } else if kind.is_chart() {
    let Some(groups) = resolved.groups() else {
      return;
    };
    let data = groups
      .iter()
      .map(|g| serde_json::json!({ "label": g.key, "value": g.value }))
      .collect();
    let grouped = groups
      .iter()
      .map(|g| {
        let rows = g.records.iter().map(|r| Value::Object((*r).clone())).collect();
        (g.key.clone(), Value::Array(rows))
      })
      .collect();
    config.insert("data".into(), Value::Array(data));
    config.insert("groupedRecords".into(), Value::Object(grouped));
  }
}

/// Whole numbers are written as JSON integers.
fn number_value(n: f64) -> Value {
  if n.fract() == 0.0 && n.abs() < 9.0e15 {
    Value::from(n as i64)
  } else {
    Value::from(n)
  }
}
