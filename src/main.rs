mod app;
mod interp;
mod model;
mod persist;
mod scene;
mod store;
mod viewport;

use std::path::PathBuf;

use eframe::egui;

use app::PointmarkApp;

fn usage() -> ! {
    eprintln!("Usage: pointmark --input <image folder> --output <annotation folder>");
    std::process::exit(1);
}

fn parse_args() -> (Option<PathBuf>, Option<PathBuf>) {
    let mut input = None;
    let mut output = None;
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-i" | "--input" => input = args.next().map(PathBuf::from),
            "-o" | "--output" => output = args.next().map(PathBuf::from),
            _ => usage(),
        }
    }
    (input, output)
}

fn folder_or_dialog(folder: Option<PathBuf>, prompt: &str) -> PathBuf {
    if let Some(folder) = folder {
        return folder;
    }
    match rfd::FileDialog::new().set_title(prompt).pick_folder() {
        Some(folder) => folder,
        None => usage(),
    }
}

fn main() {
    env_logger::init();

    let (input, output) = parse_args();
    let input = folder_or_dialog(input, "Select the image folder");
    let output = folder_or_dialog(output, "Select the annotation output folder");

    if !input.is_dir() {
        eprintln!("Not a folder: {}", input.display());
        std::process::exit(1);
    }
    if !output.is_dir() {
        eprintln!("Not a folder: {}", output.display());
        std::process::exit(1);
    }

    let title = format!(
        "pointmark — {}",
        input.file_name().unwrap_or_default().to_str().unwrap_or("")
    );

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_title(&title),
        ..Default::default()
    };

    eframe::run_native(
        &title,
        options,
        Box::new(move |_cc| Ok(Box::new(PointmarkApp::new(&input, &output)))),
    )
    .expect("Failed to run eframe");
}
