pub mod datafile;
pub mod generators;
pub mod harness;
pub mod schema;

use std::path::PathBuf;

use schema::{DatasetInfo, Parameter, SetInfo};

pub fn fmt_open_err(e: impl ToString, path: &PathBuf) -> String {
    format!("Unable to open {}: {}", path_str(path), e.to_string())
}

pub fn path_str(path: &PathBuf) -> &str {
    path.to_str().unwrap_or("<unknown path>")
}

/// Values taken by the varied parameter, from its base value up to `to`.
pub fn xvalues(info: &DatasetInfo) -> impl Iterator<Item = u32> {
    let start = match info.vary {
        Parameter::Density     => info.props.density,
        Parameter::Selectivity => info.props.selectivity,
        Parameter::Size        => info.props.max_len,
        Parameter::Skew        => info.props.skewness_factor,
    };
    (start..=info.to).step_by(info.step.max(1) as usize)
}

pub fn props_at_x(info: &DatasetInfo, x: u32) -> SetInfo {
    let mut props = info.props.clone();
    let prop = match info.vary {
        Parameter::Density     => &mut props.density,
        Parameter::Selectivity => &mut props.selectivity,
        Parameter::Size        => &mut props.max_len,
        Parameter::Skew        => &mut props.skewness_factor,
    };
    *prop = x;

    props
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset(vary: Parameter, to: u32, step: u32) -> DatasetInfo {
        DatasetInfo {
            name: "test".to_string(),
            vary,
            to,
            step,
            gen_count: 1,
            props: SetInfo {
                density: 100,
                selectivity: 1000,
                max_len: 10,
                skewness_factor: 0,
            },
        }
    }

    #[test]
    fn xvalues_start_at_base() {
        let info = dataset(Parameter::Size, 16, 2);
        assert_eq!(xvalues(&info).collect::<Vec<_>>(), vec![10, 12, 14, 16]);

        let info = dataset(Parameter::Selectivity, 1000, 500);
        assert_eq!(xvalues(&info).collect::<Vec<_>>(), vec![1000]);
    }

    #[test]
    fn props_at_x_sets_varied_parameter() {
        let info = dataset(Parameter::Skew, 4, 1);
        let props = props_at_x(&info, 3);
        assert_eq!(props.skewness_factor, 3);
        assert_eq!(props.max_len, 10);
    }
}
