//! Daily metric timelines at a 15-minute resolution.
//!
//! A [`Series`] holds one day of samples for one node: 96 points, one per
//! 15-minute slot. A leaf contributes its metric value at every sample that
//! falls inside its activity span and 0 elsewhere. Interior nodes are
//! rendered as the set of their leaf descendants' series, optionally merged
//! into a single pointwise sum.

use serde::Serialize;

use crate::clock::MINUTES_PER_DAY;
use crate::error::TimelineResult;
use crate::metric::Metric;
use crate::view::IndividualView;

/// Samples per day.
pub const SAMPLES_PER_DAY: usize = 96;

/// Minutes between consecutive samples.
pub const SAMPLE_MINUTES: u32 = MINUTES_PER_DAY / SAMPLES_PER_DAY as u32;

/// One day of metric samples for one named node.
#[derive(Debug, Clone, Serialize)]
pub struct Series {
    pub name: String,
    pub points: Vec<f64>,
}

impl Series {
    fn zeroed(name: String) -> Self {
        Self {
            name,
            points: vec![0.0; SAMPLES_PER_DAY],
        }
    }

    /// Sample the metric over the leaf's activity span.
    fn for_leaf(view: &IndividualView<'_>, metric: Metric) -> TimelineResult<Self> {
        let value = metric.evaluate(view)?;
        let span = view.span()?;
        let mut series = Self::zeroed(view.local_name().to_string());
        for (i, point) in series.points.iter_mut().enumerate() {
            if span.contains(i as u32 * SAMPLE_MINUTES) {
                *point = value;
            }
        }
        Ok(series)
    }

    /// Pointwise sum of the given series, under the given name.
    fn merged(name: String, parts: &[Series]) -> Self {
        let mut out = Self::zeroed(name);
        for part in parts {
            for (total, point) in out.points.iter_mut().zip(&part.points) {
                *total += point;
            }
        }
        out
    }
}

/// Render the metric timelines under a node.
///
/// A leaf yields its own single series. An interior node yields one series
/// per leaf descendant; with `merge` set, a single pointwise sum named after
/// the node replaces them.
pub fn timelines(
    view: &IndividualView<'_>,
    metric: Metric,
    merge: bool,
) -> TimelineResult<Vec<Series>> {
    let mut series = Vec::new();
    if view.is_leaf()? {
        series.push(Series::for_leaf(view, metric)?);
    } else {
        for node in view.descendants()? {
            if node.is_leaf()? {
                series.push(Series::for_leaf(&node, metric)?);
            }
        }
    }
    if merge {
        let total = Series::merged(view.local_name().to_string(), &series);
        return Ok(vec![total]);
    }
    Ok(series)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edit::IndividualEditor;
    use crate::naming::Namespace;
    use crate::store::GraphStore;
    use oxigraph::io::RdfFormat;

    const NS: &str = "http://example.org/demand#";

    fn fixture() -> (GraphStore, Namespace) {
        let store = GraphStore::in_memory().unwrap();
        store
            .load_document(
                RdfFormat::Turtle,
                "@prefix : <http://example.org/demand#> .\n\
                 @prefix owl: <http://www.w3.org/2002/07/owl#> .\n\
                 :Alimentador a owl:Class .\n\
                 :Recurso a owl:Class .\n\
                 :Pertence_A a owl:ObjectProperty .\n"
                    .as_bytes(),
            )
            .unwrap();
        (store, Namespace::new(NS))
    }

    fn props(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn sample_grid_shape() {
        assert_eq!(SAMPLES_PER_DAY, 96);
        assert_eq!(SAMPLE_MINUTES, 15);
        assert_eq!(SAMPLES_PER_DAY as u32 * SAMPLE_MINUTES, MINUTES_PER_DAY);
    }

    #[test]
    fn leaf_with_default_span_is_flat() {
        let (store, ns) = fixture();
        IndividualEditor::new(&store, &ns)
            .create(
                "Recurso",
                "R1",
                &props(&[
                    ("int:Potência_Aparente", "100"),
                    ("double:Fator_de_Demanda", "0.8"),
                ]),
            )
            .unwrap();
        let view = IndividualView::resolve(&store, &ns, "R1").unwrap().unwrap();

        let series = timelines(&view, Metric::Demand, false).unwrap();
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].name, "R1");
        assert_eq!(series[0].points.len(), SAMPLES_PER_DAY);
        assert!(series[0].points.iter().all(|&p| p == 80.0));
    }

    #[test]
    fn leaf_span_limits_active_samples() {
        let (store, ns) = fixture();
        IndividualEditor::new(&store, &ns)
            .create(
                "Recurso",
                "R1",
                &props(&[
                    ("int:Potência_Aparente", "60"),
                    ("literal:Hora_de_Início", "08:00"),
                    ("literal:Tempo_de_Duração", "01:00"),
                ]),
            )
            .unwrap();
        let view = IndividualView::resolve(&store, &ns, "R1").unwrap().unwrap();

        let series = timelines(&view, Metric::ApparentPower, false).unwrap();
        let points = &series[0].points;
        // 08:00 is sample 32; one hour covers four samples.
        assert_eq!(points[31], 0.0);
        assert_eq!(points[32], 60.0);
        assert_eq!(points[35], 60.0);
        assert_eq!(points[36], 0.0);
        assert_eq!(points.iter().filter(|&&p| p != 0.0).count(), 4);
    }

    #[test]
    fn wrapped_span_is_active_across_midnight() {
        let (store, ns) = fixture();
        IndividualEditor::new(&store, &ns)
            .create(
                "Recurso",
                "R1",
                &props(&[
                    ("int:Potência_Aparente", "10"),
                    ("literal:Hora_de_Início", "23:00"),
                    ("literal:Tempo_de_Duração", "02:00"),
                ]),
            )
            .unwrap();
        let view = IndividualView::resolve(&store, &ns, "R1").unwrap().unwrap();

        let points = timelines(&view, Metric::ApparentPower, false).unwrap()[0]
            .points
            .clone();
        assert_eq!(points[92], 10.0); // 23:00
        assert_eq!(points[95], 10.0); // 23:45
        assert_eq!(points[0], 10.0); // 00:00
        assert_eq!(points[3], 10.0); // 00:45
        assert_eq!(points[4], 0.0); // 01:00
        assert_eq!(points[91], 0.0); // 22:45
    }

    #[test]
    fn interior_node_yields_leaf_series_and_merge_sums_them() {
        let (store, ns) = fixture();
        let editor = IndividualEditor::new(&store, &ns);
        editor.create("Alimentador", "F1", &[]).unwrap();
        editor
            .create(
                "Recurso",
                "R1",
                &props(&[
                    ("int:Potência_Aparente", "100"),
                    ("resource:Pertence_A", "F1"),
                ]),
            )
            .unwrap();
        editor
            .create(
                "Recurso",
                "R2",
                &props(&[
                    ("int:Potência_Aparente", "50"),
                    ("literal:Hora_de_Início", "12:00"),
                    ("literal:Tempo_de_Duração", "00:30"),
                    ("resource:Pertence_A", "F1"),
                ]),
            )
            .unwrap();
        let feeder = IndividualView::resolve(&store, &ns, "F1").unwrap().unwrap();

        let series = timelines(&feeder, Metric::ApparentPower, false).unwrap();
        assert_eq!(series.len(), 2);
        let mut names: Vec<_> = series.iter().map(|s| s.name.as_str()).collect();
        names.sort();
        assert_eq!(names, ["R1", "R2"]);

        let merged = timelines(&feeder, Metric::ApparentPower, true).unwrap();
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].name, "F1");
        // 12:00 is sample 48; R2 adds two samples on top of R1's constant 100.
        assert_eq!(merged[0].points[48], 150.0);
        assert_eq!(merged[0].points[49], 150.0);
        assert_eq!(merged[0].points[50], 100.0);
        assert_eq!(merged[0].points[0], 100.0);
    }
}
