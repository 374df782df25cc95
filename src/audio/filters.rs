use serde::Serialize;
use std::{fmt, str::FromStr};

/// Cantidad de bandas del ecualizador del nodo
pub const EQ_BANDS: usize = 15;

/// Rango de ganancia aceptado por `set_eq` (-0.25 silencia, 0.25 duplica)
pub const EQ_GAIN_RANGE: std::ops::RangeInclusive<f64> = -0.25..=1.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EqualizerBand {
    pub band: usize,
    pub gain: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Timescale {
    pub speed: f64,
    pub pitch: f64,
    pub rate: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Rotation {
    pub rotation_hz: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Karaoke {
    pub level: f64,
    pub mono_level: f64,
    pub filter_band: f64,
    pub filter_width: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LowPass {
    pub smoothing: f64,
}

/// Vibrato y tremolo comparten forma
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Oscillation {
    pub frequency: f64,
    pub depth: f64,
}

/// Bloque de parámetros del op `filters`; las secciones ausentes se resetean en el nodo
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub equalizer: Option<Vec<EqualizerBand>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timescale: Option<Timescale>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotation: Option<Rotation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub karaoke: Option<Karaoke>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub low_pass: Option<LowPass>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vibrato: Option<Oscillation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tremolo: Option<Oscillation>,
}

/// Presets de filtros predefinidos
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Filter {
    #[default]
    None,
    EightD,
    Bassboost,
    Classical,
    Electronic,
    Karaoke,
    Lovenightcore,
    Nightcore,
    Pop,
    Rock,
    Soft,
    Treblebass,
    Tremolo,
    Vaporwave,
    Vibrato,
}

impl Filter {
    pub const ALL: [Filter; 15] = [
        Filter::None,
        Filter::EightD,
        Filter::Bassboost,
        Filter::Classical,
        Filter::Electronic,
        Filter::Karaoke,
        Filter::Lovenightcore,
        Filter::Nightcore,
        Filter::Pop,
        Filter::Rock,
        Filter::Soft,
        Filter::Treblebass,
        Filter::Tremolo,
        Filter::Vaporwave,
        Filter::Vibrato,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Filter::None => "None",
            Filter::EightD => "8d",
            Filter::Bassboost => "Bassboost",
            Filter::Classical => "Classical",
            Filter::Electronic => "Electronic",
            Filter::Karaoke => "Karaoke",
            Filter::Lovenightcore => "Lovenightcore",
            Filter::Nightcore => "Nightcore",
            Filter::Pop => "Pop",
            Filter::Rock => "Rock",
            Filter::Soft => "Soft",
            Filter::Treblebass => "Treblebass",
            Filter::Tremolo => "Tremolo",
            Filter::Vaporwave => "Vaporwave",
            Filter::Vibrato => "Vibrato",
        }
    }

    /// Parámetros completos del preset
    pub fn payload(self) -> FilterPayload {
        match self {
            Filter::None => FilterPayload::default(),
            Filter::EightD => FilterPayload {
                rotation: Some(Rotation { rotation_hz: 0.2 }),
                ..Default::default()
            },
            Filter::Bassboost => equalizer(&[
                0.6, 0.7, 0.8, 0.55, 0.25, 0.0, -0.25, -0.45, -0.55, -0.7, -0.3, -0.25, 0.0, 0.0, 0.0,
            ]),
            Filter::Classical => equalizer(&[
                0.375, 0.35, 0.125, 0.0, 0.0, 0.125, 0.55, 0.05, 0.125, 0.25, 0.2, 0.25, 0.3, 0.25, 0.3,
            ]),
            Filter::Electronic => equalizer(&[
                0.375, 0.35, 0.125, 0.0, 0.0, -0.125, -0.125, 0.0, 0.25, 0.125, 0.15, 0.2, 0.25, 0.35,
                0.4,
            ]),
            Filter::Karaoke => FilterPayload {
                karaoke: Some(Karaoke {
                    level: 1.0,
                    mono_level: 1.0,
                    filter_band: 220.0,
                    filter_width: 100.0,
                }),
                ..Default::default()
            },
            Filter::Lovenightcore => FilterPayload {
                timescale: Some(Timescale {
                    speed: 1.1,
                    pitch: 1.2,
                    rate: 1.0,
                }),
                ..Default::default()
            },
            Filter::Nightcore => FilterPayload {
                timescale: Some(Timescale {
                    speed: 1.2999999523162842,
                    pitch: 1.2999999523162842,
                    rate: 1.0,
                }),
                ..Default::default()
            },
            Filter::Pop => equalizer(&[
                0.65, 0.45, -0.45, -0.65, -0.35, 0.45, 0.55, 0.6, 0.6, 0.6, 0.0, 0.0, 0.0, 0.0,
            ]),
            Filter::Rock => equalizer(&[
                0.3, 0.25, 0.2, 0.1, 0.05, -0.05, -0.15, -0.2, -0.1, -0.05, 0.05, 0.1, 0.2, 0.25, 0.3,
            ]),
            Filter::Soft => FilterPayload {
                low_pass: Some(LowPass { smoothing: 20.0 }),
                ..Default::default()
            },
            Filter::Treblebass => equalizer(&[
                0.6, 0.67, 0.67, 0.0, -0.5, 0.15, -0.45, 0.23, 0.35, 0.45, 0.55, 0.6, 0.55, 0.0,
            ]),
            Filter::Tremolo => FilterPayload {
                tremolo: Some(Oscillation {
                    frequency: 10.0,
                    depth: 0.5,
                }),
                ..Default::default()
            },
            Filter::Vaporwave => FilterPayload {
                equalizer: Some(vec![
                    EqualizerBand { band: 1, gain: 0.3 },
                    EqualizerBand { band: 0, gain: 0.3 },
                ]),
                timescale: Some(Timescale {
                    speed: 0.8500000238418579,
                    pitch: 0.800000011920929,
                    rate: 1.0,
                }),
                ..Default::default()
            },
            Filter::Vibrato => FilterPayload {
                vibrato: Some(Oscillation {
                    frequency: 10.0,
                    depth: 0.9,
                }),
                ..Default::default()
            },
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Nombre de preset desconocido
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownFilter(pub String);

impl fmt::Display for UnknownFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "preset '{}' no encontrado", self.0)
    }
}

impl std::error::Error for UnknownFilter {}

impl FromStr for Filter {
    type Err = UnknownFilter;

    /// Búsqueda sin distinguir mayúsculas ("bassboost" == "Bassboost")
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Filter::ALL
            .into_iter()
            .find(|f| f.name().eq_ignore_ascii_case(needle))
            .ok_or_else(|| UnknownFilter(s.to_string()))
    }
}

fn equalizer(gains: &[f64]) -> FilterPayload {
    FilterPayload {
        equalizer: Some(
            gains
                .iter()
                .enumerate()
                .map(|(band, &gain)| EqualizerBand { band, gain })
                .collect(),
        ),
        ..Default::default()
    }
}
