use std::collections::HashMap;

use serde::{Serialize, Deserialize};

pub type DatasetId = String;
pub type AlgorithmId = String;

// An integer i represents the fraction i/PERCENT_F (from 0.0 to 1.0)
pub const PERCENT: u32 = 10000;
pub const PERCENT_F: f64 = PERCENT as f64;

#[derive(Serialize, Deserialize, Debug)]
pub struct Experiment {
    pub experiment: Vec<ExperimentEntry>,
    pub dataset: Vec<DatasetInfo>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ExperimentEntry {
    pub name: String,
    pub title: String,
    pub dataset: DatasetId,
    pub algorithms: Vec<AlgorithmId>,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
pub struct DatasetInfo {
    pub name: DatasetId,
    pub vary: Parameter,
    pub to: u32,
    pub step: u32,
    pub gen_count: usize,
    #[serde(flatten)]
    pub props: SetInfo,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
pub struct SetInfo {
    /// Large set length over the value domain, in units of 1/PERCENT.
    pub density: u32,
    /// Shared elements over the small set length, in units of 1/PERCENT.
    pub selectivity: u32,
    /// log2 of the large set length.
    pub max_len: u32,
    /// The small set is `2^skewness_factor` times shorter than the large one.
    pub skewness_factor: u32,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum Parameter {
    Density,
    Selectivity,
    Size,
    Skew,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct Results {
    pub experiments: Vec<ExperimentEntry>,
    pub datasets: HashMap<DatasetId, DatasetResults>,
}

pub type AlgorithmResults = HashMap<AlgorithmId, Vec<ResultRun>>;

#[derive(Serialize, Deserialize, Debug)]
pub struct DatasetResults {
    pub info: DatasetInfo,
    pub algos: AlgorithmResults,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ResultRun {
    pub x: u32,
    // Nanoseconds
    pub times: Vec<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_experiment_toml() {
        let experiment: Experiment = toml::from_str(r#"
            [[experiment]]
            name = "skew"
            title = "Varying skew"
            dataset = "skew_2set"
            algorithms = ["qfilter", "simd_galloping", "roaring"]

            [[dataset]]
            name = "skew_2set"
            vary = "skew"
            to = 8
            step = 1
            gen_count = 4
            density = 100
            selectivity = 1000
            max_len = 16
            skewness_factor = 0
        "#).unwrap();

        assert_eq!(experiment.experiment.len(), 1);
        assert_eq!(experiment.experiment[0].algorithms.len(), 3);

        let dataset = &experiment.dataset[0];
        assert_eq!(dataset.vary, Parameter::Skew);
        assert_eq!(dataset.props.max_len, 16);
    }

    #[test]
    fn dataset_info_json_round_trip() {
        let info = DatasetInfo {
            name: "size".to_string(),
            vary: Parameter::Size,
            to: 20,
            step: 2,
            gen_count: 3,
            props: SetInfo {
                density: 50,
                selectivity: 5000,
                max_len: 12,
                skewness_factor: 2,
            },
        };
        let json = serde_json::to_string(&info).unwrap();
        let parsed: DatasetInfo = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, info);
    }
}
