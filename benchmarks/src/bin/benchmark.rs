use std::{
    fs::{self, File},
    collections::{HashMap, HashSet},
    path::PathBuf,
    time::Duration,
};
use benchmarks::{
    fmt_open_err, path_str,
    schema::*, datafile,
    harness::Algorithm,
};
use clap::Parser;
use colored::*;

const TARGET_WARMUP: Duration = Duration::from_millis(1000);

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[arg(default_value = "experiment.toml", long)]
    experiment: PathBuf,
    #[arg(default_value = "datasets/", long)]
    datasets: PathBuf,
    #[arg(default_value = "results.json", long)]
    out: PathBuf,
    // Ignore --bench provided by cargo.
    #[arg(long, action)]
    bench: bool,
    experiments: Vec<String>,
}

fn main() {
    let cli = Cli::parse();

    if cfg!(debug_assertions) {
        println!("{}", "warning: running in debug mode".yellow().bold());
    }

    if let Err(e) = bench_from_files(&cli) {
        let msg = format!("error: {}", e);
        println!("{}", msg.red().bold());
    }
}

fn bench_from_files(cli: &Cli) -> Result<(), String> {
    let experiment_toml = fs::read_to_string(&cli.experiment)
        .map_err(|e| fmt_open_err(e, &cli.experiment))?;

    let experiment: Experiment = toml::from_str(&experiment_toml)
        .map_err(|e| format!(
            "invalid toml file {}: {}",
            path_str(&cli.experiment), e
        ))?;

    let dataset_algos = gen_dataset_to_algos_map(cli, &experiment);

    if dataset_algos.is_empty() {
        return Err("no algorithm matches found".to_string());
    }

    let results = run_experiments(cli, experiment, dataset_algos)?;

    write_results(results, &cli.out)?;

    Ok(())
}

type AlgorithmSet = HashSet<AlgorithmId>;

/// Map each dataset to the algorithms which need to be run on it, so that a
/// dataset/algorithm pair shared by several experiments only runs once.
fn gen_dataset_to_algos_map(cli: &Cli, experiment: &Experiment)
    -> HashMap<DatasetId, AlgorithmSet>
{
    let mut dataset_algos: HashMap<DatasetId, AlgorithmSet> = HashMap::new();
    for e in &experiment.experiment {
        if cli.experiments.is_empty() || cli.experiments.contains(&e.name) {
            dataset_algos
                .entry(e.dataset.clone())
                .or_default()
                .extend(e.algorithms.iter().cloned());
        }
    }
    dataset_algos
}

fn run_experiments(
    cli: &Cli,
    experiment: Experiment,
    dataset_algos: HashMap<DatasetId, AlgorithmSet>)
    -> Result<Results, String>
{
    let mut results = HashMap::<DatasetId, DatasetResults>::new();

    for dataset in &experiment.dataset {
        if let Some(algos) = dataset_algos.get(&dataset.name) {
            let dataset_results = DatasetResults {
                info: dataset.clone(),
                algos: run_dataset_benchmarks(cli, dataset, algos)?,
            };
            results.insert(dataset.name.clone(), dataset_results);
        }
    }

    let experiments = if !cli.experiments.is_empty() {
        experiment.experiment
            .into_iter()
            .filter(|e| cli.experiments.contains(&e.name))
            .collect()
    } else {
        experiment.experiment
    };

    Ok(Results {
        experiments,
        datasets: results,
    })
}

fn run_dataset_benchmarks(
    cli: &Cli,
    info: &DatasetInfo,
    algos: &AlgorithmSet) -> Result<AlgorithmResults, String>
{
    println!("{}", &info.name.green().bold());

    let dataset_dir = cli.datasets.join(&info.name);

    let mut algorithm_results: AlgorithmResults =
        algos.iter().map(|a| (a.clone(), Vec::new())).collect();

    for x in benchmarks::xvalues(info) {
        let xlabel = format!("[x: {:4}]", x);
        println!("{}", xlabel.bold());
        let xdir = dataset_dir.join(x.to_string());

        let pairs: Vec<PathBuf> = fs::read_dir(&xdir)
            .map_err(|e| fmt_open_err(e, &xdir))?
            .map(|s| s
                .map_err(|e| format!(
                    "unable to open directory entry in {}: {}",
                    path_str(&xdir), e
                ))
                .map(|s| s.path())
            )
            .collect::<Result<_, String>>()?;

        for (name, runs) in &mut algorithm_results {
            println!("  {}", name);

            if let Some(algorithm) = Algorithm::from_name(name) {
                runs.push(time_algorithm_on_x(x, algorithm, &pairs)?);
            }
            else {
                println!("{}", format!("  unknown algorithm {}", name).yellow());
            }
        }
    }
    Ok(algorithm_results)
}

fn time_algorithm_on_x(
    x: u32,
    algorithm: Algorithm,
    datafile_paths: &[PathBuf]) -> Result<ResultRun, String>
{
    let mut times = Vec::with_capacity(datafile_paths.len());

    for datafile_path in datafile_paths {
        let datafile = File::open(datafile_path)
            .map_err(|e| fmt_open_err(e, datafile_path))?;

        let sets = datafile::from_reader(datafile)
            .map_err(|e| format!(
                "invalid datafile {}: {}",
                path_str(datafile_path), e
            ))?;

        if sets.len() != 2 {
            return Err(format!(
                "{}: expected 2 sets, got {}",
                path_str(datafile_path), sets.len()
            ));
        }

        let warmup = TARGET_WARMUP.div_f32(datafile_paths.len() as f32);

        match algorithm.time(warmup, &sets[0], &sets[1]) {
            Ok(time) => times.push(time.as_nanos() as u64),
            Err(e) => {
                println!("{}", format!("warn: {}", e).yellow());
                break;
            },
        }
    }

    Ok(ResultRun { x, times })
}

fn write_results(results: Results, path: &PathBuf) -> Result<(), String> {
    let results_file = File::options()
        .write(true).create(true).truncate(true)
        .open(path)
        .map_err(|e| fmt_open_err(e, path))?;

    serde_json::to_writer(results_file, &results)
        .map_err(|e| format!(
            "failed to write {}: {}",
            path_str(path), e
        ))?;

    Ok(())
}
