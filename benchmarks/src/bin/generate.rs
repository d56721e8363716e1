use benchmarks::{schema::*, datafile, path_str, fmt_open_err, generators};
use clap::Parser;
use colored::*;
use rand::thread_rng;
use std::{path::PathBuf, fs, io::{self, Write}};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[arg(default_value = "experiment.toml")]
    experiment: PathBuf,
    #[arg(default_value = "datasets/")]
    datasets: PathBuf,
    #[arg(long, action)]
    clean: bool,
}

fn main() {
    let cli = Cli::parse();

    let result = if cli.clean {
        cli.clean().map_err(|e| e.to_string())
    }
    else {
        cli.generate()
    };

    if let Err(err) = result {
        println!("{}", err.red().bold());
    }
    else {
        println!("{}", "Done".green().bold());
    }
}

impl Cli {
    fn clean(&self) -> io::Result<()> {
        match fs::remove_dir_all(&self.datasets) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }

    fn generate(&self) -> Result<(), String> {
        let experiment_toml = fs::read_to_string(&self.experiment)
            .map_err(|e| fmt_open_err(e, &self.experiment))?;

        let experiment: Experiment = toml::from_str(&experiment_toml)
            .map_err(|e| format!(
                "invalid toml file {}: {}",
                path_str(&self.experiment), e
            ))?;

        for dataset in &experiment.dataset {
            maybe_generate_dataset(&self.datasets, dataset)?;
        }
        Ok(())
    }
}

fn maybe_generate_dataset(datasets: &PathBuf, info: &DatasetInfo) -> Result<(), String> {
    let dataset_path = datasets.join(&info.name);
    let info_path = datasets.join(info.name.clone() + ".json");

    if let Ok(info_file) = fs::File::open(&info_path) {
        let existing_info: DatasetInfo =
            serde_json::from_reader(info_file)
            .map_err(|e| format!(
                "invalid json file {}: {}",
                path_str(&info_path), e
            ))?;

        if existing_info == *info {
            println!("{} {}", "Skipping".bold(), info.name);
            return Ok(());
        }
        else {
            println!("{} {}", "Rebuilding".green().bold(), info.name);
        }
    }
    else {
        println!("{} {}", "Building".green().bold(), info.name);
    }

    generate_dataset(info, &dataset_path)?;

    let info_file = create_file(&info_path)?;
    serde_json::to_writer(info_file, info)
        .map_err(|e| e.to_string())?;

    Ok(())
}

fn generate_dataset(info: &DatasetInfo, path: &PathBuf) -> Result<(), String> {
    let _ = fs::remove_dir_all(path);
    let rng = &mut thread_rng();

    for x in benchmarks::xvalues(info) {
        let label = format!("[x: {:5}] ", x);
        print!("{}", label.bold());

        let xdir = path.join(x.to_string());
        fs::create_dir_all(&xdir)
            .map_err(|e| format!(
                "failed to create directory {}:\n{}",
                path_str(&xdir), e
            ))?;

        let props = benchmarks::props_at_x(info, x);
        for i in 0..info.gen_count {
            print!("{} ", i);
            let _ = io::stdout().flush();

            let (small, large) = generators::gen_twoset(rng, &props);

            let pair_path = xdir.join(i.to_string());
            let mut writer = io::BufWriter::new(create_file(&pair_path)?);

            datafile::to_writer(&mut writer, &[small, large])
                .map_err(|e| e.to_string())?;
            writer.flush()
                .map_err(|e| e.to_string())?;
        }
        println!();
    }
    Ok(())
}

fn create_file(path: &PathBuf) -> Result<fs::File, String> {
    fs::File::options()
        .write(true)
        .truncate(true)
        .create(true)
        .open(path)
        .map_err(|e| format!(
            "failed to open file {}:\n{}",
            path_str(path), e
        ))
}
