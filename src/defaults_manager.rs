//! # Defaults Manager Module
//!
//! ## Purpose
//! Central place for every default the diagram setup engine falls back to:
//! ranges a component gets when it is put on an axis, values it gets when it
//! is taken off, the Y ranges of SED diagrams and the options passed to the
//! diagram programs. Nothing in the engine hardcodes these numbers.
//!
//! ## Architecture
//! - **DiagramDefaults**: serializable defaults record
//! - **DefaultsManager**: loads/saves the record and validates updates
//! - **Global Access**: `OnceLock<Mutex<_>>` singleton
//! - **Configuration File**: `diagram_defaults.json`
//!
//! ## Stored units
//! Ranges of the pH, pe and activity families are log10 activities, so the
//! default pH range 1..12 is kept as `(-12.0, -1.0)`; Eh is in volts, totals
//! in mol/L.
//!
//! ## Usage
//! ```rust, ignore
//! use ChemDiagramSetup::defaults_manager::{with_defaults_manager, with_defaults_manager_mut};
//!
//! let defaults = with_defaults_manager(|manager| manager.get_config().clone());
//! with_defaults_manager_mut(|manager| manager.set_temperature(50.0))?;
//! ```

use crate::DiagramSetup::axis_assignment::ConcentrationSpec;
use crate::DiagramSetup::component_roles::Role;
use crate::DiagramSetup::concentration_types::{ConcType, DiagramType, activity_fixed_for};
use crate::DiagramSetup::range_converter::pe_to_eh;
use crate::DiagramSetup::setup_errors::SetupError;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::{Mutex, MutexGuard, OnceLock};

/// number format requested from the diagram programs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NumberFormat {
    Default,
    Scientific,
    Engineering,
}

/// options handed to SED/Predom besides the assignment itself
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramOptions {
    /// calculation steps along each axis
    pub steps: u32,
    /// activity coefficient model, used when the ionic strength is not zero
    pub activity_model: u8,
    /// 0 = mol/L, 1 = mmol/L, 2 = µmol/L
    pub units: u8,
    /// plot aqueous species only
    pub aqueous_only: bool,
    /// axes of H+ and e- shown as pH / pe instead of log activity
    pub display_ph_pe: bool,
    pub number_format: NumberFormat,
}

impl Default for ProgramOptions {
    fn default() -> Self {
        Self {
            steps: 50,
            activity_model: 0,
            units: 0,
            aqueous_only: false,
            display_ph_pe: true,
            number_format: NumberFormat::Default,
        }
    }
}

/// defaults record, persisted as JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagramDefaults {
    /// log a(H+), i.e. pH 1..12
    pub proton_range: (f64, f64),
    /// log a(e-)
    pub electron_range: (f64, f64),
    /// Eh in V
    pub eh_range: (f64, f64),
    pub log_activity_range: (f64, f64),
    pub log_total_range: (f64, f64),
    pub total_range: (f64, f64),
    pub log_pressure_range: (f64, f64),

    /// log a(H+) of a fixed pH
    pub proton_fixed: f64,
    /// log a(e-) of a fixed pe
    pub electron_fixed: f64,
    pub log_activity_fixed: f64,
    pub log_pressure_fixed: f64,
    pub total_fixed: f64,
    /// total concentration of H+ or e- when it is the calculated quantity
    pub calculated_total_fixed: f64,

    pub log_y_range: (f64, f64),
    pub relative_activity_y_range: (f64, f64),
    pub calculated_ph_y_range: (f64, f64),
    pub calculated_pe_y_range: (f64, f64),
    pub calculated_eh_y_range: (f64, f64),

    /// °C
    pub temperature: f64,
    pub ionic_strength: f64,
    pub use_eh_for_electron: bool,
    pub allow_reversed_ranges: bool,
    pub program: ProgramOptions,
}

impl Default for DiagramDefaults {
    fn default() -> Self {
        Self {
            proton_range: (-12.0, -1.0),
            electron_range: (-17.0, 17.0),
            eh_range: (-1.0, 1.0),
            log_activity_range: (-8.0, -2.0),
            log_total_range: (-6.0, -1.0),
            total_range: (1e-6, 1e-2),
            log_pressure_range: (-6.0, 0.0),
            proton_fixed: -7.0,
            electron_fixed: -8.0,
            log_activity_fixed: -3.0,
            log_pressure_fixed: -3.5,
            total_fixed: 1e-3,
            calculated_total_fixed: 0.0,
            log_y_range: (-9.0, 1.0),
            relative_activity_y_range: (-3.0, 3.0),
            calculated_ph_y_range: (0.0, 14.0),
            calculated_pe_y_range: (-17.0, 17.0),
            calculated_eh_y_range: (-1.0, 1.0),
            temperature: 25.0,
            ionic_strength: 0.0,
            use_eh_for_electron: false,
            allow_reversed_ranges: false,
            program: ProgramOptions::default(),
        }
    }
}

impl DiagramDefaults {
    /// default range of a varied representation for a component of `role`
    pub fn varied_range(&self, role: Role, t: ConcType) -> (f64, f64) {
        match t {
            ConcType::TotalVaried => self.total_range,
            ConcType::LogTotalVaried => self.log_total_range,
            ConcType::PhVaried => self.proton_range,
            ConcType::PeVaried => self.electron_range,
            ConcType::EhVaried => self.eh_range,
            ConcType::LogPVaried => self.log_pressure_range,
            ConcType::ActivityVaried => match role {
                Role::Proton => self.proton_range,
                Role::Electron => self.electron_range,
                Role::Gas => self.log_pressure_range,
                _ => self.log_activity_range,
            },
            fixed => self.varied_range(role, fixed.varied_counterpart()),
        }
    }

    /// default value of a fixed representation for a component of `role`
    pub fn fixed_value(&self, role: Role, t: ConcType, temperature: f64) -> f64 {
        match t.fixed_counterpart() {
            ConcType::TotalFixed => match role {
                Role::Proton | Role::Electron => self.calculated_total_fixed,
                _ => self.total_fixed,
            },
            ConcType::PhFixed => self.proton_fixed,
            ConcType::PeFixed => self.electron_fixed,
            ConcType::EhFixed => pe_to_eh(self.electron_fixed, temperature),
            ConcType::LogPFixed => self.log_pressure_fixed,
            _ => match role {
                Role::Water | Role::Solid => 0.0,
                Role::Proton => self.proton_fixed,
                Role::Electron => self.electron_fixed,
                Role::Gas => self.log_pressure_fixed,
                _ => self.log_activity_fixed,
            },
        }
    }

    pub fn varied_spec(&self, role: Role, t: ConcType) -> ConcentrationSpec {
        let (low, high) = self.varied_range(role, t);
        ConcentrationSpec::varied(t, low, high)
    }

    pub fn fixed_spec(&self, role: Role, t: ConcType, temperature: f64) -> ConcentrationSpec {
        ConcentrationSpec::fixed(t, self.fixed_value(role, t, temperature))
    }

    /// spec a component gets when it is not on an axis and has no other choice:
    /// H+ at a fixed pH, e- at a fixed pe/Eh, water at activity 1, a gas at a
    /// fixed partial pressure, everything else at a fixed total concentration
    pub fn role_default_fixed(&self, role: Role, use_eh: bool, temperature: f64) -> ConcentrationSpec {
        let t = match role {
            Role::Proton | Role::Electron | Role::Water | Role::Gas => activity_fixed_for(role, use_eh),
            _ => ConcType::TotalFixed,
        };
        self.fixed_spec(role, t, temperature)
    }

    /// default min/max of the plotted Y quantity; `None` where the diagram has none
    pub fn y_range_for(&self, diagram: DiagramType, use_eh: bool) -> Option<(f64, f64)> {
        match diagram {
            DiagramType::LogSolubilities | DiagramType::Logarithmic | DiagramType::LogActivities => {
                Some(self.log_y_range)
            }
            DiagramType::RelativeActivities => Some(self.relative_activity_y_range),
            DiagramType::CalculatedPh => Some(self.calculated_ph_y_range),
            DiagramType::CalculatedPeOrEh if use_eh => Some(self.calculated_eh_y_range),
            DiagramType::CalculatedPeOrEh => Some(self.calculated_pe_y_range),
            DiagramType::PredominanceArea | DiagramType::Fraction | DiagramType::HAffinitySpectrum => None,
        }
    }
}

fn check_range(what: &str, range: (f64, f64)) -> Result<(), SetupError> {
    if !range.0.is_finite() || !range.1.is_finite() {
        return Err(SetupError::OutOfRange {
            what: what.to_string(),
            value: if range.0.is_finite() { range.1 } else { range.0 },
        });
    }
    if range.0 == range.1 {
        return Err(SetupError::OutOfRange {
            what: format!("{} (empty range)", what),
            value: range.0,
        });
    }
    Ok(())
}

/// Loads, validates and persists [`DiagramDefaults`].
#[derive(Debug, Clone)]
pub struct DefaultsManager {
    config: DiagramDefaults,
    config_file: String,
}

impl DefaultsManager {
    /// Loads `diagram_defaults.json` from the working directory, or built-in
    /// defaults when the file is absent or unreadable.
    pub fn new() -> Self {
        Self::with_config_file("diagram_defaults.json")
    }

    pub fn with_config_file(config_file: &str) -> Self {
        let config = match Self::load_config(config_file) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Could not read defaults from '{}' ({}), using built-in defaults",
                    config_file, e
                );
                DiagramDefaults::default()
            }
        };
        Self {
            config,
            config_file: config_file.to_string(),
        }
    }

    fn load_config(config_file: &str) -> Result<DiagramDefaults, SetupError> {
        if Path::new(config_file).exists() {
            let content = fs::read_to_string(config_file)?;
            let config: DiagramDefaults = serde_json::from_str(&content)?;
            info!("Diagram defaults loaded from '{}'", config_file);
            Ok(config)
        } else {
            Ok(DiagramDefaults::default())
        }
    }

    /// Writes the current defaults to the config file.
    /// During tests this does nothing so the real config file stays untouched.
    pub fn save_config(&self) -> Result<(), SetupError> {
        #[cfg(test)]
        {
            return Ok(());
        }

        #[cfg(not(test))]
        {
            let content = serde_json::to_string_pretty(&self.config)?;
            fs::write(&self.config_file, content)?;
            Ok(())
        }
    }

    pub fn config_file(&self) -> &str {
        &self.config_file
    }

    pub fn get_config(&self) -> &DiagramDefaults {
        &self.config
    }

    pub fn set_temperature(&mut self, temperature: f64) -> Result<(), SetupError> {
        if !(-50.0..=400.0).contains(&temperature) {
            return Err(SetupError::OutOfRange {
                what: "temperature (°C)".to_string(),
                value: temperature,
            });
        }
        self.config.temperature = temperature;
        self.save_config()
    }

    pub fn set_ionic_strength(&mut self, ionic_strength: f64) -> Result<(), SetupError> {
        if !ionic_strength.is_finite() {
            return Err(SetupError::OutOfRange {
                what: "ionic strength".to_string(),
                value: ionic_strength,
            });
        }
        self.config.ionic_strength = ionic_strength;
        self.save_config()
    }

    pub fn set_use_eh(&mut self, use_eh: bool) -> Result<(), SetupError> {
        self.config.use_eh_for_electron = use_eh;
        self.save_config()
    }

    pub fn set_allow_reversed_ranges(&mut self, allow: bool) -> Result<(), SetupError> {
        self.config.allow_reversed_ranges = allow;
        self.save_config()
    }

    /// pH range as typed by the user (pH units, not log activity)
    pub fn set_ph_range(&mut self, ph_low: f64, ph_high: f64) -> Result<(), SetupError> {
        check_range("pH range", (ph_low, ph_high))?;
        let (a, b) = (-ph_high, -ph_low);
        self.config.proton_range = (a.min(b), a.max(b));
        self.save_config()
    }

    /// pe range as typed by the user (pe units, not log activity)
    pub fn set_pe_range(&mut self, pe_low: f64, pe_high: f64) -> Result<(), SetupError> {
        check_range("pe range", (pe_low, pe_high))?;
        let (a, b) = (-pe_high, -pe_low);
        self.config.electron_range = (a.min(b), a.max(b));
        self.save_config()
    }

    pub fn set_eh_range(&mut self, low: f64, high: f64) -> Result<(), SetupError> {
        check_range("Eh range", (low, high))?;
        self.config.eh_range = (low.min(high), low.max(high));
        self.save_config()
    }

    pub fn set_log_total_range(&mut self, low: f64, high: f64) -> Result<(), SetupError> {
        check_range("log total range", (low, high))?;
        self.config.log_total_range = (low.min(high), low.max(high));
        self.save_config()
    }

    pub fn set_program_options(&mut self, options: ProgramOptions) -> Result<(), SetupError> {
        if options.steps == 0 {
            return Err(SetupError::OutOfRange {
                what: "calculation steps".to_string(),
                value: 0.0,
            });
        }
        self.config.program = options;
        self.save_config()
    }

    pub fn reset_to_defaults(&mut self) -> Result<(), SetupError> {
        self.config = DiagramDefaults::default();
        self.save_config()
    }
}

impl Default for DefaultsManager {
    fn default() -> Self {
        Self::new()
    }
}

static GLOBAL_DEFAULTS_MANAGER: OnceLock<Mutex<DefaultsManager>> = OnceLock::new();

/// Returns a guard to the process-wide manager.
pub fn get_defaults_manager() -> MutexGuard<'static, DefaultsManager> {
    GLOBAL_DEFAULTS_MANAGER
        .get_or_init(|| Mutex::new(DefaultsManager::new()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Runs `f` with read access to the global manager.
pub fn with_defaults_manager<F, R>(f: F) -> R
where
    F: FnOnce(&DefaultsManager) -> R,
{
    let manager = get_defaults_manager();
    f(&manager)
}

/// Runs `f` with write access to the global manager.
pub fn with_defaults_manager_mut<F, R>(f: F) -> R
where
    F: FnOnce(&mut DefaultsManager) -> R,
{
    let mut manager = get_defaults_manager();
    f(&mut manager)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_missing_file_gives_builtin_defaults() {
        let manager = DefaultsManager::with_config_file("/nonexistent/diagram_defaults.json");
        assert_eq!(manager.get_config(), &DiagramDefaults::default());
        assert_eq!(manager.get_config().proton_range, (-12.0, -1.0));
    }

    #[test]
    fn test_defaults_from_config_file() {
        let mut defaults = DiagramDefaults::default();
        defaults.temperature = 60.0;
        defaults.use_eh_for_electron = true;
        let mut config_file = NamedTempFile::new().unwrap();
        config_file
            .write_all(serde_json::to_string_pretty(&defaults).unwrap().as_bytes())
            .unwrap();

        let manager = DefaultsManager::with_config_file(config_file.path().to_str().unwrap());
        assert_eq!(manager.get_config().temperature, 60.0);
        assert!(manager.get_config().use_eh_for_electron);
    }

    #[test]
    fn test_broken_config_file_falls_back() {
        let mut config_file = NamedTempFile::new().unwrap();
        config_file.write_all(b"{ not json").unwrap();
        let manager = DefaultsManager::with_config_file(config_file.path().to_str().unwrap());
        assert_eq!(manager.get_config(), &DiagramDefaults::default());
    }

    #[test]
    fn test_setters_validate() {
        let mut manager = DefaultsManager::with_config_file("/nonexistent/defaults.json");
        assert!(manager.set_temperature(500.0).is_err());
        assert!(manager.set_temperature(80.0).is_ok());
        assert_eq!(manager.get_config().temperature, 80.0);

        assert!(manager.set_ph_range(4.0, 4.0).is_err());
        manager.set_ph_range(2.0, 10.0).unwrap();
        assert_eq!(manager.get_config().proton_range, (-10.0, -2.0));

        manager.set_pe_range(-10.0, 15.0).unwrap();
        assert_eq!(manager.get_config().electron_range, (-15.0, 10.0));
        assert!(manager.set_log_total_range(-3.0, f64::INFINITY).is_err());
        manager.set_log_total_range(-2.0, -8.0).unwrap();
        assert_eq!(manager.get_config().log_total_range, (-8.0, -2.0));
        manager.set_use_eh(true).unwrap();
        assert!(manager.get_config().use_eh_for_electron);

        assert!(manager.set_eh_range(f64::NAN, 1.0).is_err());
        let mut options = ProgramOptions::default();
        options.steps = 0;
        assert!(manager.set_program_options(options).is_err());

        manager.reset_to_defaults().unwrap();
        assert_eq!(manager.get_config(), &DiagramDefaults::default());
    }

    #[test]
    fn test_role_default_fixed() {
        let d = DiagramDefaults::default();
        let water = d.role_default_fixed(Role::Water, false, 25.0);
        assert_eq!(water.conc_type, ConcType::ActivityFixed);
        assert_eq!(water.low, 0.0);
        let h = d.role_default_fixed(Role::Proton, false, 25.0);
        assert_eq!(h.conc_type, ConcType::PhFixed);
        assert_eq!(h.low, -7.0);
        let e = d.role_default_fixed(Role::Electron, true, 25.0);
        assert_eq!(e.conc_type, ConcType::EhFixed);
        assert!(e.low > 0.4 && e.low < 0.5);
        let fe = d.role_default_fixed(Role::Cation, false, 25.0);
        assert_eq!(fe.conc_type, ConcType::TotalFixed);
        assert!(fe.high.is_nan());
        let gas = d.role_default_fixed(Role::Gas, false, 25.0);
        assert_eq!(gas.conc_type, ConcType::LogPFixed);
    }

    #[test]
    fn test_y_ranges() {
        let d = DiagramDefaults::default();
        assert_eq!(d.y_range_for(DiagramType::Logarithmic, false), Some((-9.0, 1.0)));
        assert_eq!(d.y_range_for(DiagramType::HAffinitySpectrum, false), None);
        assert_eq!(
            d.y_range_for(DiagramType::CalculatedPeOrEh, true),
            Some((-1.0, 1.0))
        );
    }
}
