use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

pub const TASK_CHART_CANVAS: &str = "projectChart";

pub fn mini_chart_canvas(index: usize) -> String {
    format!("project-mini-chart-{index}")
}

pub fn research_chart_canvas(index: usize) -> String {
    format!("research-chart-{index}")
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Bar,
    Doughnut,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ChartSpec {
    pub kind: ChartKind,
    pub labels: Vec<String>,
    pub data: Vec<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub center_text: Option<String>,
}

impl ChartSpec {
    pub fn task_bars(labels: &[String], completion: &[bool]) -> Self {
        Self {
            kind: ChartKind::Bar,
            labels: labels.to_vec(),
            data: (0..labels.len())
                .map(|task| if completion.get(task).copied().unwrap_or(false) { 100 } else { 0 })
                .collect(),
            center_text: None,
        }
    }

    pub fn percent_doughnut(percent: u32) -> Self {
        let percent = percent.min(100);
        Self {
            kind: ChartKind::Doughnut,
            labels: vec!["Done".to_string(), "Remaining".to_string()],
            data: vec![percent, 100 - percent],
            center_text: Some(format!("{percent}%")),
        }
    }
}

/// Handle to one live chart instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartHandle {
    pub id: u64,
    pub canvas: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct LiveChart {
    pub id: u64,
    pub canvas: String,
    pub spec: ChartSpec,
}

/// The set of chart instances currently bound to canvases.
///
/// Like the browser charting library it stands in for, the board happily
/// binds several instances to one canvas; keeping that from happening is the
/// caller's job.
#[derive(Debug, Default)]
pub struct ChartBoard {
    next_id: u64,
    live: BTreeMap<u64, LiveChart>,
    cleared: BTreeSet<String>,
}

impl ChartBoard {
    pub fn create(&mut self, canvas: &str, spec: ChartSpec) -> ChartHandle {
        self.next_id += 1;
        let id = self.next_id;
        self.cleared.remove(canvas);
        self.live.insert(
            id,
            LiveChart {
                id,
                canvas: canvas.to_string(),
                spec,
            },
        );
        ChartHandle {
            id,
            canvas: canvas.to_string(),
        }
    }

    pub fn destroy(&mut self, handle: &ChartHandle) -> bool {
        self.live.remove(&handle.id).is_some()
    }

    pub fn clear_canvas(&mut self, canvas: &str) {
        self.cleared.insert(canvas.to_string());
    }

    pub fn is_cleared(&self, canvas: &str) -> bool {
        self.cleared.contains(canvas)
    }

    pub fn live_on(&self, canvas: &str) -> usize {
        self.live.values().filter(|chart| chart.canvas == canvas).count()
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    pub fn spec_on(&self, canvas: &str) -> Option<&ChartSpec> {
        self.live
            .values()
            .rev()
            .find(|chart| chart.canvas == canvas)
            .map(|chart| &chart.spec)
    }

    pub fn live(&self) -> impl Iterator<Item = &LiveChart> {
        self.live.values()
    }
}

/// Live instances one view created, destroyed together before that view
/// renders again.
#[derive(Debug, Default)]
pub struct ChartRegistry {
    handles: Vec<ChartHandle>,
}

impl ChartRegistry {
    pub fn dispose(&mut self, board: &mut ChartBoard) {
        for handle in self.handles.drain(..) {
            board.destroy(&handle);
        }
    }

    pub fn track(&mut self, handle: ChartHandle) {
        self.handles.push(handle);
    }
}
