use std::env;
use std::fs;
use std::process;

use score_timeline::{convert, detect_ensembles, ConversionOptions, Ensemble, Score};

fn main() {
    tracing_subscriber::fmt::init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: score-timeline <score.yaml> [options.yaml]");
        process::exit(1);
    }

    let score_path = &args[1];
    let options_path = args.get(2);

    // Read input files
    let source = match fs::read_to_string(score_path) {
        Ok(content) => content,
        Err(e) => {
            eprintln!("Error reading file '{}': {}", score_path, e);
            process::exit(1);
        }
    };

    let options = match options_path {
        Some(path) => match fs::read_to_string(path) {
            Ok(content) => ConversionOptions::from_yaml(&content),
            Err(e) => {
                eprintln!("Error reading file '{}': {}", path, e);
                process::exit(1);
            }
        },
        None => Ok(ConversionOptions::default()),
    };

    let result = Score::from_yaml(&source).and_then(|score| {
        let options = options?;
        if options.ensemble == Ensemble::Ungrouped {
            suggest_ensemble(&score);
        }
        convert(&score, &options)
    });

    let timeline = match result {
        Ok(timeline) => timeline,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    match serde_yaml::to_string(&timeline) {
        Ok(yaml) => print!("{}", yaml),
        Err(e) => {
            eprintln!("Error writing timeline: {}", e);
            process::exit(1);
        }
    }
}

fn suggest_ensemble(score: &Score) {
    let Some(best) = detect_ensembles(score).into_iter().next() else {
        return;
    };
    if best.ensemble == Ensemble::Ungrouped || best.confidence <= 0.0 {
        return;
    }
    eprintln!(
        "Info: Ensemble detected: {} ({:.0}%). Set \"ensemble: {}\" to group instruments.",
        best.ensemble,
        best.confidence * 100.0,
        best.ensemble
    );
}
