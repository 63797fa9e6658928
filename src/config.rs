use crate::error::DashboardError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "dashboard.json";

/// Free-text markers that delimit a stay-period block in the reservations
/// workbook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlockMarkers {
    /// Text that flags a marker row, e.g. `FECHAS DE ESTANCIA`.
    pub marker: String,
    /// Word between the two dates inside the parentheses, e.g. `AL`.
    pub range_word: String,
    /// First-cell value that closes a block, compared upper-cased.
    pub sentinel: String,
}

impl Default for BlockMarkers {
    fn default() -> Self {
        Self {
            marker: "FECHAS DE ESTANCIA".to_string(),
            range_word: "AL".to_string(),
            sentinel: "TOTALES".to_string(),
        }
    }
}

/// Dashboard configuration. Every field has a default, so a config file only
/// needs the keys it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub dashboard_title: String,
    pub reservations_path: PathBuf,
    pub nationalities_path: PathBuf,
    pub ages_path: PathBuf,
    pub output_dir: PathBuf,
    pub block_markers: BlockMarkers,
    /// How many lodging types get a trend chart.
    pub top_lodging_types: usize,
    /// Nationality label -> English country name. `null` marks aggregate
    /// buckets that cannot be placed on a map.
    pub country_names: BTreeMap<String, Option<String>>,
    pub lodging_captions: BTreeMap<String, String>,
    pub default_lodging_caption: String,
    pub reservations_conclusion: String,
}

impl DashboardConfig {
    /// Read the config at `path`, or fall back to the defaults when the file
    /// does not exist.
    pub fn load(path: &Path) -> Result<Self, DashboardError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path).map_err(|source| DashboardError::ReadConfig {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| DashboardError::ParseConfig {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn lodging_caption(&self, lodging_type: &str) -> &str {
        self.lodging_captions
            .get(lodging_type)
            .map(String::as_str)
            .unwrap_or(self.default_lodging_caption.as_str())
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        let country_names = [
            ("España", Some("Spain")),
            ("Francia", Some("France")),
            ("Alemania", Some("Germany")),
            ("Rumania", Some("Romania")),
            ("Bélgica", Some("Belgium")),
            ("Argentina", Some("Argentina")),
            ("México", Some("Mexico")),
            ("Suiza", Some("Switzerland")),
            ("Suecia", Some("Sweden")),
            ("Austria", Some("Austria")),
            ("Noruega", Some("Norway")),
            ("Nueva Zelanda", Some("New Zealand")),
            ("Bosnia", Some("Bosnia and Herzegovina")),
            ("Resto de África", None),
            ("Otros paises", None),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.map(str::to_string)))
        .collect();

        let lodging_captions = [
            (
                "Casa Rural 4 Pax",
                "Este alojamiento presenta su pico más alto en mayo, lo que indica que es popular en primavera. Ideal para escapadas familiares o puentes largos.",
            ),
            (
                "Parcela",
                "Las parcelas muestran un crecimiento constante hacia los meses de verano, especialmente agosto. Indica una alta demanda de campistas estacionales.",
            ),
            (
                "Parcela Grande Caravana o Tienda",
                "Tiene un aumento muy claro entre marzo y abril, lo que sugiere su atractivo para escapadas de primavera o Semana Santa.",
            ),
            (
                "MH - 6 Pax",
                "Su ocupación aumenta significativamente entre mayo y julio, lo cual refleja una preferencia para grupos más grandes o familias en temporada alta.",
            ),
            (
                "Casas Alpinas",
                "A pesar de tener una demanda estable, los picos en abril y julio indican que se trata de un alojamiento de nicho buscado en épocas específicas.",
            ),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        Self {
            dashboard_title: "Dashboard de Análisis - Camping Nerpio 2025".to_string(),
            reservations_path: PathBuf::from("ESTADISTICA RESERVAS WEB EN 2025.xlsx"),
            nationalities_path: PathBuf::from("ESTADISTICA NACIONALIDADES 25.xlsx"),
            ages_path: PathBuf::from("ESTADISTICA SOBRE EDADES Y ALOJAMIENTOS 2025 (1).xlsx"),
            output_dir: PathBuf::from("dashboard_output"),
            block_markers: BlockMarkers::default(),
            top_lodging_types: 5,
            country_names,
            lodging_captions,
            default_lodging_caption: "Destaca por su alta demanda en mayo y verano, ideal para familias numerosas, aunque marzo y abril muestran margen de mejora.".to_string(),
            reservations_conclusion: "Los cinco alojamientos principales muestran patrones de estacionalidad distintos, siendo mayo y agosto los meses más intensos en reservas. Las parcelas destacan en verano, mientras que las casas rurales y alpinas se prefieren en primavera. Esto permite afinar estrategias de promoción por tipo de alojamiento y estación del año.".to_string(),
        }
    }
}
