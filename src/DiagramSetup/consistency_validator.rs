//! Repair pass run after every change of the setup.
//!
//! `repair` walks the record in a fixed order, each step relying on the ones
//! before it:
//! 1. X component set (H+, else e-, else the first anion, gas, or eligible component)
//! 2. Y and main component set where the diagram type uses them
//! 3. the axis components carry a varied representation
//! 4. predominance diagrams: no other component is varied
//! 5. predominance diagrams: linear total-concentration axes become logarithmic
//! 6. varied ranges with `low == high` are nudged apart
//! 7. reversed ranges are swapped unless the user allows them
//!
//! Before step 1 the specs themselves are normalized: one per component,
//! water pinned at activity 1, and every representation valid for the role
//! of its component (pe or Eh for e- according to the user's choice).
//!
//! Every change of something the user chose produces a [`SetupWarning`];
//! numeric nudges and default selections for empty slots are only logged.
use super::axis_assignment::{AxisAssignment, ConcentrationSpec};
use super::component_roles::{ChemSystem, Role};
use super::concentration_types::{
    ConcType, DiagramType, fits_role, legal_types_for, role_equivalent,
};
use super::range_converter::{convert_range, repair_degenerate};
use super::setup_errors::{SetupError, SetupWarning};
use crate::defaults_manager::DiagramDefaults;
use log::{debug, info, warn};

/// Moves a spec to another representation. Numbers are converted where the
/// two representations are numerically related; a fixed value gives no range,
/// so a spec that becomes varied takes the default range of its new type.
pub fn retype_spec(
    spec: &ConcentrationSpec,
    target: ConcType,
    role: Role,
    defaults: &DiagramDefaults,
    temperature: f64,
) -> ConcentrationSpec {
    if spec.conc_type == target {
        return *spec;
    }
    let from = spec.conc_type.family();
    let to = target.family();
    if target.is_varied() {
        if !spec.is_varied() {
            return defaults.varied_spec(role, target);
        }
        match convert_range(spec.low, spec.high, temperature, from, to) {
            Some((low, high)) if low.is_finite() && high.is_finite() => {
                ConcentrationSpec::varied(target, low, high)
            }
            _ => defaults.varied_spec(role, target),
        }
    } else {
        match convert_range(spec.low, f64::NAN, temperature, from, to) {
            Some((low, _)) if low.is_finite() => ConcentrationSpec::fixed(target, low),
            _ => defaults.fixed_spec(role, target, temperature),
        }
    }
}

/// components that may be put on the X axis of `diagram`
pub fn x_candidates(system: &ChemSystem, diagram: DiagramType) -> Vec<usize> {
    system
        .components
        .iter()
        .filter(|c| match c.role {
            Role::Water => false,
            Role::Proton => diagram != DiagramType::CalculatedPh,
            Role::Electron => diagram != DiagramType::CalculatedPeOrEh,
            _ => true,
        })
        .map(|c| c.index)
        .collect()
}

/// Y selections offered for `diagram`: axis components for predominance
/// diagrams, components for fraction diagrams, components and reaction
/// products for relative activities; never the X component
pub fn y_candidates(
    system: &ChemSystem,
    diagram: DiagramType,
    comp_x: Option<usize>,
) -> Vec<usize> {
    let mut candidates: Vec<usize> = match diagram {
        DiagramType::PredominanceArea => x_candidates(system, diagram),
        DiagramType::Fraction | DiagramType::RelativeActivities => system
            .components
            .iter()
            .filter(|c| c.role != Role::Water)
            .map(|c| c.index)
            .collect(),
        _ => Vec::new(),
    };
    if diagram == DiagramType::RelativeActivities {
        candidates.extend(
            system
                .products
                .iter()
                .filter(|p| p.role != Role::Water)
                .map(|p| p.index),
        );
    }
    candidates.retain(|i| Some(*i) != comp_x);
    candidates
}

/// components that may be the main component
pub fn main_candidates(system: &ChemSystem) -> Vec<usize> {
    system
        .components
        .iter()
        .filter(|c| c.role != Role::Water)
        .map(|c| c.index)
        .collect()
}

fn first_with(system: &ChemSystem, candidates: &[usize], role: Role) -> Option<usize> {
    candidates
        .iter()
        .copied()
        .find(|i| system.species(*i).is_some_and(|c| c.role == role))
}

/// default axis component: H+, e-, first anion, first gas, first candidate
pub fn pick_axis_default(system: &ChemSystem, candidates: &[usize]) -> Option<usize> {
    [Role::Proton, Role::Electron, Role::Anion, Role::Gas]
        .into_iter()
        .find_map(|role| first_with(system, candidates, role))
        .or_else(|| candidates.first().copied())
}

/// default main component: a metal cation first, then neutral, anion, gas;
/// candidates listed in `avoid` are taken only when nothing else is left
pub fn pick_main_default(
    system: &ChemSystem,
    candidates: &[usize],
    avoid: &[Option<usize>],
) -> Option<usize> {
    let order = |pool: &[usize]| {
        [Role::Cation, Role::NeutralAqueous, Role::Anion, Role::Gas, Role::Solid]
            .into_iter()
            .find_map(|role| first_with(system, pool, role))
            .or_else(|| pool.first().copied())
    };
    let preferred: Vec<usize> = candidates
        .iter()
        .copied()
        .filter(|i| !avoid.contains(&Some(*i)))
        .collect();
    order(preferred.as_slice()).or_else(|| order(candidates))
}

fn describe(system: &ChemSystem, index: Option<usize>) -> String {
    index.map_or_else(|| "none".to_string(), |i| system.name(i).to_string())
}

/// full repair pass; returns the warnings for every user-visible change
pub fn repair(
    assignment: &mut AxisAssignment,
    system: &ChemSystem,
    defaults: &DiagramDefaults,
) -> Vec<SetupWarning> {
    let mut warnings = Vec::new();
    normalize_specs(assignment, system, defaults, &mut warnings);
    ensure_x(assignment, system, &mut warnings);
    ensure_y_and_main(assignment, system, &mut warnings);
    ensure_y_range(assignment, defaults);
    force_axes_varied(assignment, system, defaults, &mut warnings);
    fix_non_axis_components(assignment, system, defaults, &mut warnings);
    hold_calculated_species(assignment, system, defaults, &mut warnings);
    upgrade_linear_axes(assignment, system, defaults, &mut warnings);
    repair_degenerate_ranges(assignment, system, defaults);
    normalize_reversed_ranges(assignment);
    for w in &warnings {
        warn!("{}", w);
    }
    warnings
}

fn normalize_specs(
    a: &mut AxisAssignment,
    system: &ChemSystem,
    defaults: &DiagramDefaults,
    warnings: &mut Vec<SetupWarning>,
) {
    let n = system.n_components();
    let before = a.specs.len();
    a.specs.retain(|i, _| *i < n);
    if a.specs.len() != before {
        debug!("dropped {} specs of unknown components", before - a.specs.len());
    }
    let use_eh = a.use_eh_for_electron;
    let t = a.temperature;
    for c in &system.components {
        let Some(spec) = a.specs.get(&c.index).copied() else {
            info!("{}: no concentration given, using default", c.identifier);
            a.specs
                .insert(c.index, defaults.role_default_fixed(c.role, use_eh, t));
            continue;
        };
        if c.role == Role::Water {
            let pinned = ConcentrationSpec::fixed(ConcType::ActivityFixed, 0.0);
            if spec != pinned {
                if spec.conc_type != ConcType::ActivityFixed || spec.low != 0.0 {
                    warnings.push(SetupWarning::invalid(
                        &c.identifier,
                        "water is always at activity 1 (log activity = 0)",
                    ));
                }
                a.specs.insert(c.index, pinned);
            }
            continue;
        }
        let spec = if fits_role(spec.conc_type, c.role, use_eh) {
            spec
        } else {
            let target = role_equivalent(spec.conc_type, c.role, use_eh);
            let new = retype_spec(&spec, target, c.role, defaults, t);
            warnings.push(SetupWarning::invalid(
                &c.identifier,
                format!(
                    "\"{}\" is not available, changed to \"{}\"",
                    spec.conc_type.label(),
                    target.label()
                ),
            ));
            new
        };
        let spec = if spec.is_varied() {
            if spec.low.is_finite() && spec.high.is_finite() {
                spec
            } else {
                debug!("{}: incomplete range replaced by default", c.identifier);
                defaults.varied_spec(c.role, spec.conc_type)
            }
        } else if spec.low.is_finite() {
            spec
        } else {
            debug!("{}: missing value replaced by default", c.identifier);
            defaults.fixed_spec(c.role, spec.conc_type, t)
        };
        a.specs.insert(c.index, spec);
    }
}

fn ensure_x(a: &mut AxisAssignment, system: &ChemSystem, warnings: &mut Vec<SetupWarning>) {
    let candidates = x_candidates(system, a.diagram_type);
    if a.comp_x.is_some_and(|x| candidates.contains(&x)) {
        return;
    }
    let new = pick_axis_default(system, &candidates);
    match a.comp_x {
        Some(old) => warnings.push(SetupWarning::invalid(
            system.name(old),
            format!(
                "cannot be on the X-axis of a \"{}\" diagram; X-axis set to {}",
                a.diagram_type.label(a.use_eh_for_electron),
                describe(system, new)
            ),
        )),
        None => info!("X-axis component set to {}", describe(system, new)),
    }
    a.comp_x = new;
}

fn ensure_y_and_main(a: &mut AxisAssignment, system: &ChemSystem, warnings: &mut Vec<SetupWarning>) {
    let diagram = a.diagram_type;
    if !diagram.needs_y_and_main() {
        if a.comp_y.is_some() || a.comp_main.is_some() {
            debug!("Y and main components not used by \"{}\"", diagram.label(false));
        }
        a.comp_y = None;
        a.comp_main = None;
        return;
    }

    let candidates = y_candidates(system, diagram, a.comp_x);
    if !a.comp_y.is_some_and(|y| candidates.contains(&y)) {
        let new = if diagram.is_predominance() {
            pick_axis_default(system, &candidates)
        } else {
            pick_main_default(system, &candidates, &[])
        };
        match a.comp_y {
            Some(old) => warnings.push(SetupWarning::invalid(
                system.name(old),
                format!(
                    "cannot be the Y component of a \"{}\" diagram; Y set to {}",
                    diagram.label(a.use_eh_for_electron),
                    describe(system, new)
                ),
            )),
            None => info!("Y component set to {}", describe(system, new)),
        }
        a.comp_y = new;
    }

    let mains = main_candidates(system);
    if diagram.uses_y_species() && a.comp_y.is_some_and(|y| y < system.n_components()) {
        // fractions and relative activities are those of the Y component
        a.comp_main = a.comp_y;
        return;
    }
    if !a.comp_main.is_some_and(|m| mains.contains(&m)) {
        let new = pick_main_default(system, &mains, &[a.comp_x, a.comp_y]);
        match a.comp_main {
            Some(old) => warnings.push(SetupWarning::invalid(
                system.name(old),
                format!("cannot be the main component; main set to {}", describe(system, new)),
            )),
            None => info!("main component set to {}", describe(system, new)),
        }
        a.comp_main = new;
    }
}

fn ensure_y_range(a: &mut AxisAssignment, defaults: &DiagramDefaults) {
    if !a.diagram_type.uses_y_range() {
        a.y_range = None;
        return;
    }
    let (mut low, mut high) = match a.y_range {
        Some((low, high)) if low.is_finite() && high.is_finite() => (low, high),
        _ => defaults
            .y_range_for(a.diagram_type, a.use_eh_for_electron)
            .unwrap_or(defaults.log_y_range),
    };
    if low == high {
        (low, high) = repair_degenerate(low, high, a.allow_reversed_ranges);
    }
    if low > high && !a.allow_reversed_ranges {
        (low, high) = (high, low);
    }
    a.y_range = Some((low, high));
}

fn axis_components(a: &AxisAssignment) -> Vec<usize> {
    let mut axes: Vec<usize> = a.comp_x.into_iter().collect();
    if a.diagram_type.is_predominance() {
        axes.extend(a.comp_y);
    }
    axes
}

fn force_axes_varied(
    a: &mut AxisAssignment,
    system: &ChemSystem,
    defaults: &DiagramDefaults,
    warnings: &mut Vec<SetupWarning>,
) {
    let diagram = a.diagram_type;
    for idx in axis_components(a) {
        let (Some(role), Some(spec)) = (system.role(idx), a.specs.get(&idx).copied()) else {
            continue;
        };
        let legal = legal_types_for(role, diagram, true, a.use_eh_for_electron);
        let t = spec.conc_type;
        // a linear total axis on a predominance diagram is upgraded in its own step
        let pending_upgrade = diagram.is_predominance() && t == ConcType::TotalVaried;
        if t.is_varied() && (legal.contains(&t) || pending_upgrade) {
            continue;
        }
        let nearest = t.varied_counterpart();
        let target = if legal.contains(&nearest) {
            nearest
        } else if nearest == ConcType::TotalVaried && legal.contains(&ConcType::LogTotalVaried) {
            ConcType::LogTotalVaried
        } else if let Some(first) = legal.first() {
            *first
        } else {
            continue;
        };
        let new = retype_spec(&spec, target, role, defaults, a.temperature);
        if t.is_varied() {
            warnings.push(SetupWarning::invalid(
                system.name(idx),
                format!(
                    "\"{}\" is not available on this axis, changed to \"{}\"",
                    t.label(),
                    target.label()
                ),
            ));
        } else {
            info!("{} on an axis: \"{}\"", system.name(idx), target.label());
        }
        a.specs.insert(idx, new);
    }
}

fn fix_non_axis_components(
    a: &mut AxisAssignment,
    system: &ChemSystem,
    defaults: &DiagramDefaults,
    warnings: &mut Vec<SetupWarning>,
) {
    if !a.diagram_type.is_predominance() {
        return;
    }
    let axes = axis_components(a);
    for c in &system.components {
        if c.role == Role::Water || axes.contains(&c.index) {
            continue;
        }
        let Some(spec) = a.specs.get(&c.index).copied() else {
            continue;
        };
        if !spec.is_varied() {
            continue;
        }
        let target = spec.conc_type.fixed_counterpart();
        let new = retype_spec(&spec, target, c.role, defaults, a.temperature);
        warnings.push(SetupWarning::invalid(
            &c.identifier,
            format!(
                "only axis components can be varied in a predominance diagram; changed from \"{}\" to \"{}\"",
                spec.conc_type.label(),
                target.label()
            ),
        ));
        a.specs.insert(c.index, new);
    }
}

/// the species whose pH / pe is calculated is given as a total concentration
fn hold_calculated_species(
    a: &mut AxisAssignment,
    system: &ChemSystem,
    defaults: &DiagramDefaults,
    warnings: &mut Vec<SetupWarning>,
) {
    let calculated = match a.diagram_type {
        DiagramType::CalculatedPh => system.proton(),
        DiagramType::CalculatedPeOrEh => system.electron(),
        _ => None,
    };
    let Some(idx) = calculated else {
        return;
    };
    let (Some(role), Some(spec)) = (system.role(idx), a.specs.get(&idx).copied()) else {
        return;
    };
    if a.is_on_axis(idx) || spec.conc_type == ConcType::TotalFixed {
        return;
    }
    let new = retype_spec(&spec, ConcType::TotalFixed, role, defaults, a.temperature);
    warnings.push(SetupWarning::invalid(
        system.name(idx),
        format!(
            "is calculated in a \"{}\" diagram; changed from \"{}\" to \"{}\"",
            a.diagram_type.label(a.use_eh_for_electron),
            spec.conc_type.label(),
            ConcType::TotalFixed.label()
        ),
    ));
    a.specs.insert(idx, new);
}

fn upgrade_linear_axes(
    a: &mut AxisAssignment,
    system: &ChemSystem,
    defaults: &DiagramDefaults,
    warnings: &mut Vec<SetupWarning>,
) {
    if !a.diagram_type.is_predominance() {
        return;
    }
    for idx in axis_components(a) {
        let (Some(role), Some(spec)) = (system.role(idx), a.specs.get(&idx).copied()) else {
            continue;
        };
        if spec.conc_type != ConcType::TotalVaried {
            continue;
        }
        let new = retype_spec(&spec, ConcType::LogTotalVaried, role, defaults, a.temperature);
        warnings.push(SetupWarning::invalid(
            system.name(idx),
            format!(
                "predominance axes are logarithmic; changed from \"{}\" to \"{}\"",
                ConcType::TotalVaried.label(),
                ConcType::LogTotalVaried.label()
            ),
        ));
        a.specs.insert(idx, new);
    }
}

fn repair_degenerate_ranges(a: &mut AxisAssignment, system: &ChemSystem, defaults: &DiagramDefaults) {
    let allow_reversed = a.allow_reversed_ranges;
    for (idx, spec) in a.specs.iter_mut() {
        if !spec.is_varied() {
            continue;
        }
        if !spec.low.is_finite() || !spec.high.is_finite() {
            let role = system.role(*idx).unwrap_or(Role::NeutralAqueous);
            *spec = defaults.varied_spec(role, spec.conc_type);
        }
        if spec.low == spec.high {
            let (low, high) = repair_degenerate(spec.low, spec.high, allow_reversed);
            debug!("{}: empty range {} moved to {}..{}", system.name(*idx), spec.low, low, high);
            spec.high = high;
        }
    }
}

fn normalize_reversed_ranges(a: &mut AxisAssignment) {
    if a.allow_reversed_ranges {
        return;
    }
    for spec in a.specs.values_mut() {
        if spec.is_varied() && spec.low > spec.high {
            debug!("reversed range {}..{} swapped", spec.low, spec.high);
            std::mem::swap(&mut spec.low, &mut spec.high);
        }
    }
}

fn violation(message: String) -> Result<(), SetupError> {
    Err(SetupError::InvariantViolation(message))
}

/// Checks every invariant of a finished assignment. Used before the
/// assignment is handed to the diagram programs.
pub fn check_invariants(a: &AxisAssignment, system: &ChemSystem) -> Result<(), SetupError> {
    let diagram = a.diagram_type;
    let use_eh = a.use_eh_for_electron;

    if a.specs.len() != system.n_components() {
        return violation(format!(
            "{} concentration specs for {} components",
            a.specs.len(),
            system.n_components()
        ));
    }
    for c in &system.components {
        let Some(spec) = a.spec(c.index) else {
            return violation(format!("no concentration for {}", c.identifier));
        };
        if c.role == Role::Water && *spec != ConcentrationSpec::fixed(ConcType::ActivityFixed, 0.0) {
            return violation(format!("{} is not at activity 1", c.identifier));
        }
        if !fits_role(spec.conc_type, c.role, use_eh) {
            return violation(format!(
                "\"{}\" is not valid for {}",
                spec.conc_type.label(),
                c.identifier
            ));
        }
        if spec.is_varied() {
            if spec.low == spec.high {
                return violation(format!("empty range for {}", c.identifier));
            }
            if !a.allow_reversed_ranges && spec.low > spec.high {
                return violation(format!("reversed range for {}", c.identifier));
            }
        }
    }

    let x_ok = x_candidates(system, diagram);
    match a.comp_x {
        None if !x_ok.is_empty() => return violation("no X-axis component".to_string()),
        Some(x) if !x_ok.contains(&x) => {
            return violation(format!("{} cannot be on the X-axis", system.name(x)));
        }
        _ => {}
    }

    if diagram.needs_y_and_main() {
        let y_ok = y_candidates(system, diagram, a.comp_x);
        match a.comp_y {
            None if !y_ok.is_empty() => return violation("no Y component".to_string()),
            Some(y) if !y_ok.contains(&y) => {
                return violation(format!("{} cannot be the Y component", system.name(y)));
            }
            _ => {}
        }
        if a.comp_main.is_none() && !main_candidates(system).is_empty() {
            return violation("no main component".to_string());
        }
    } else if a.comp_y.is_some() || a.comp_main.is_some() {
        return violation(format!(
            "\"{}\" uses no Y or main component",
            diagram.label(use_eh)
        ));
    }

    let axes = axis_components(a);
    for idx in &axes {
        let Some(spec) = a.spec(*idx) else {
            return violation(format!("no concentration for axis component {}", idx));
        };
        if !spec.is_varied() {
            return violation(format!("axis component {} is not varied", system.name(*idx)));
        }
        if diagram.is_predominance() && spec.conc_type == ConcType::TotalVaried {
            return violation(format!("linear axis for {}", system.name(*idx)));
        }
    }
    if diagram.is_predominance() {
        if let Some(idx) = a.varied_components().into_iter().find(|i| !axes.contains(i)) {
            return violation(format!("{} is varied but not on an axis", system.name(idx)));
        }
    }
    if diagram.uses_y_range() != a.y_range.is_some() {
        return violation("Y range does not match the diagram type".to_string());
    }
    Ok(())
}
