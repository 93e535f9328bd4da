//! Binds a chart's selected parameter to the state of the data behind it.
//!
//! A `Chart` starts `Idle`. Selecting a parameter moves it to `Loading`; resolving the fetch moves
//! it to `Success` or `Error`. Selecting a different parameter later re-enters `Loading`.
//! Selecting the same parameter again changes nothing.

use crate::error::Res;
use std::fmt::Debug;
use tracing::{debug, warn};

/// Data that can be shown in a chart.
pub trait ChartData {
    /// Whether there is nothing to draw.
    fn is_empty(&self) -> bool;
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum ChartState<T> {
    Idle,
    Loading,
    Success(T),
    Error(String),
}

/// What a chart shows for its current state.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum View<'a, T> {
    /// Nothing has been selected yet.
    Blank,
    /// A placeholder while data loads.
    Skeleton,
    /// A static "failed to load" alert.
    Alert(&'a str),
    /// The data loaded and there is nothing in it.
    Empty,
    Data(&'a T),
}

#[derive(Debug, Clone)]
pub struct Chart<P, T> {
    name: &'static str,
    param: Option<P>,
    state: ChartState<T>,
}

impl<P, T> Chart<P, T>
where
    P: Clone + PartialEq + Debug,
    T: ChartData,
{
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            param: None,
            state: ChartState::Idle,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn param(&self) -> Option<&P> {
        self.param.as_ref()
    }

    pub fn state(&self) -> &ChartState<T> {
        &self.state
    }

    /// Selects `param`. Returns `true` if the chart now needs data, i.e. the parameter changed and
    /// the chart entered `Loading`.
    pub fn select(&mut self, param: P) -> bool {
        if self.param.as_ref() == Some(&param) && !matches!(self.state, ChartState::Idle) {
            return false;
        }
        debug!("{}: selected {param:?}", self.name);
        self.param = Some(param);
        self.state = ChartState::Loading;
        true
    }

    /// Stores the outcome of the fetch started by `select`. Ignored unless the chart is `Loading`.
    pub fn resolve(&mut self, result: Res<T>) {
        if !matches!(self.state, ChartState::Loading) {
            warn!("{}: ignoring a result that arrived while not loading", self.name);
            return;
        }
        self.state = match result {
            Ok(data) => ChartState::Success(data),
            Err(e) => ChartState::Error(format!("{e:#}")),
        };
    }

    pub fn view(&self) -> View<'_, T> {
        match &self.state {
            ChartState::Idle => View::Blank,
            ChartState::Loading => View::Skeleton,
            ChartState::Error(reason) => View::Alert(reason),
            ChartState::Success(data) if data.is_empty() => View::Empty,
            ChartState::Success(data) => View::Data(data),
        }
    }
}

impl<T> ChartData for Vec<T> {
    fn is_empty(&self) -> bool {
        Vec::is_empty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn test_state_machine() {
        let mut chart: Chart<i32, Vec<u8>> = Chart::new("test");
        assert_eq!(chart.state(), &ChartState::Idle);
        assert_eq!(chart.view(), View::Blank);

        assert!(chart.select(2024));
        assert_eq!(chart.state(), &ChartState::Loading);
        assert_eq!(chart.view(), View::Skeleton);

        chart.resolve(Ok(vec![1, 2]));
        assert_eq!(chart.view(), View::Data(&vec![1, 2]));

        // The same parameter does not reload.
        assert!(!chart.select(2024));
        assert_eq!(chart.state(), &ChartState::Success(vec![1, 2]));

        // A new parameter does.
        assert!(chart.select(2023));
        assert_eq!(chart.param(), Some(&2023));
        assert_eq!(chart.state(), &ChartState::Loading);
    }

    #[test]
    fn test_error_and_empty_views() {
        let mut chart: Chart<i32, Vec<u8>> = Chart::new("test");
        chart.select(1);
        chart.resolve(Err(anyhow!("connection refused")));
        assert_eq!(chart.view(), View::Alert("connection refused"));

        // An error stays until the parameter changes.
        assert!(!chart.select(1));
        assert!(matches!(chart.state(), ChartState::Error(_)));

        chart.select(2);
        chart.resolve(Ok(vec![]));
        assert_eq!(chart.view(), View::Empty);
    }

    #[test]
    fn test_resolve_ignored_when_not_loading() {
        let mut chart: Chart<i32, Vec<u8>> = Chart::new("test");
        chart.resolve(Ok(vec![1]));
        assert_eq!(chart.state(), &ChartState::Idle);
    }
}
