// Entry point and interactive menu.
//
// - Options [1]-[4] render one dashboard section: the section's workbooks
//   are read (or served from the cache), parsed, aggregated, printed as
//   markdown and exported as CSV/JSON/HTML.
// - Option [r] drops the cached workbooks so the next section re-reads them.
// - Option [0] exits.
use anyhow::Result;
use camping_dashboard::config::{DashboardConfig, CONFIG_FILE};
use camping_dashboard::loader::WorkbookCache;
use camping_dashboard::output;
use camping_dashboard::views::{self, Section};
use once_cell::sync::Lazy;
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Mutex, PoisonError};
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

// Workbooks are loaded once and reused across section switches until they
// change on disk or the user asks for a reload.
static APP_STATE: Lazy<Mutex<AppState>> = Lazy::new(|| {
    Mutex::new(AppState {
        cache: WorkbookCache::new(),
    })
});

struct AppState {
    cache: WorkbookCache,
}

const PREVIEW_ROWS: usize = 10;

/// Read a single line of input after printing the common prompt.
fn read_choice() -> Option<String> {
    print!("Opción: ");
    let _ = io::stdout().flush();
    let mut buf = String::new();
    match io::stdin().read_line(&mut buf) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(buf.trim().to_string()),
    }
}

fn print_menu() {
    println!("Ir a sección:");
    for (idx, section) in Section::ALL.iter().enumerate() {
        println!("[{}] {}", idx + 1, section.label());
    }
    println!("[r] Recargar datos");
    println!("[0] Salir\n");
}

/// Render one section, print it and export its files.
///
/// A failure (missing workbook, unreadable sheet, unwritable output dir)
/// only aborts this section; the menu keeps running.
fn handle_section(section: Section, config: &DashboardConfig) {
    let mut state = APP_STATE.lock().unwrap_or_else(PoisonError::into_inner);
    let view = match views::render(section, &mut state.cache, config) {
        Ok(view) => view,
        Err(e) => {
            error!(section = section.label(), "render failed: {:#}", e);
            eprintln!("No se pudo generar '{}': {:#}\n", section.label(), e);
            return;
        }
    };

    output::print_view(&view);
    output::preview_table(&view.table, PREVIEW_ROWS);
    match output::export_view(&config.output_dir, &view) {
        Ok(paths) => println!(
            "(Exportado a {}, {} y {})\n",
            paths.html.display(),
            paths.json.display(),
            paths.csv.display()
        ),
        Err(e) => eprintln!("Write error: {:#}\n", e),
    }
}

fn handle_reload() {
    let mut state = APP_STATE.lock().unwrap_or_else(PoisonError::into_inner);
    let cached = state.cache.len();
    state.cache.clear();
    info!(dropped = cached, "workbook cache cleared");
    println!("Datos recargados en la próxima consulta.\n");
}

fn init_logging() {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(io::stderr)
        .init();
}

fn main() -> Result<()> {
    init_logging();
    let config = DashboardConfig::load(Path::new(CONFIG_FILE))?;
    info!(output_dir = %config.output_dir.display(), "configuration loaded");

    println!("{}\n", config.dashboard_title);
    loop {
        print_menu();
        let Some(choice) = read_choice() else {
            break;
        };
        match choice.as_str() {
            "0" => break,
            "r" | "R" => handle_reload(),
            other => match Section::from_choice(other) {
                Some(section) => {
                    println!();
                    handle_section(section, &config);
                }
                None => println!("Opción no válida. Introduzca 0-4 o r.\n"),
            },
        }
    }
    println!("Saliendo del programa.");
    Ok(())
}
