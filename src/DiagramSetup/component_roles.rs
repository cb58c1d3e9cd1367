//! Classification of chemical components by their identifier and the chemical
//! system record consumed by the setup engine.
//!
//! The identifiers are the ones used in the chemical-system data files:
//! `H+`, `e-`, `H2O`, `Fe+3`, `Ca2+`, `SO4-2`, `CO2(g)`, `Fe(s)`, `SiO2(aq)`...
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// role of a component; decides which concentration representations make sense
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Cation,
    Anion,
    Gas,
    Solid,
    Water,
    Proton,
    Electron,
    NeutralAqueous,
}

/// capability interface: total classification of an identifier.
/// The predicates are derived from `classify`; implementors only provide that.
pub trait RoleClassifier {
    fn classify(&self, identifier: &str) -> Role;

    fn is_cation(&self, identifier: &str) -> bool {
        self.classify(identifier) == Role::Cation
    }
    fn is_anion(&self, identifier: &str) -> bool {
        self.classify(identifier) == Role::Anion
    }
    fn is_gas(&self, identifier: &str) -> bool {
        self.classify(identifier) == Role::Gas
    }
    fn is_solid(&self, identifier: &str) -> bool {
        self.classify(identifier) == Role::Solid
    }
    fn is_water(&self, identifier: &str) -> bool {
        self.classify(identifier) == Role::Water
    }
    fn is_proton(&self, identifier: &str) -> bool {
        self.classify(identifier) == Role::Proton
    }
    fn is_electron(&self, identifier: &str) -> bool {
        self.classify(identifier) == Role::Electron
    }
    fn is_neutral_aqueous(&self, identifier: &str) -> bool {
        self.classify(identifier) == Role::NeutralAqueous
    }
}

fn charge_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?P<body>.+?)(?P<charge>[+-]\d*|\d+[+-]|\+{2,}|-{2,})$")
            .expect("charge suffix pattern is valid")
    })
}

fn phase_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\((?P<phase>g|gas|s|c|cr|am|l|aq)\)$").expect("phase suffix pattern is valid")
    })
}

/// default classifier working on the identifier text only
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentifierClassifier;

impl RoleClassifier for IdentifierClassifier {
    fn classify(&self, identifier: &str) -> Role {
        let id = identifier.trim();
        match id {
            "H2O" | "H2O(l)" | "H2O(aq)" => return Role::Water,
            "H+" | "H+1" | "H1+" | "H(+)" => return Role::Proton,
            "e-" | "E-" | "e-1" | "e−" | "e(-)" => return Role::Electron,
            _ => {}
        }
        let mut body = id;
        if let Some(caps) = phase_regex().captures(id) {
            let phase = caps["phase"].to_lowercase();
            match phase.as_str() {
                "g" | "gas" => return Role::Gas,
                "aq" => {
                    // "(aq)" only marks the phase; the charge decides below
                    let end = caps.get(0).map_or(id.len(), |m| m.start());
                    body = &id[..end];
                }
                _ => return Role::Solid,
            }
        }
        match charge_regex().captures(body) {
            Some(caps) => {
                if caps["charge"].contains('+') {
                    Role::Cation
                } else {
                    Role::Anion
                }
            }
            None => Role::NeutralAqueous,
        }
    }
}

/// a component (or, with `index >= n_components`, a reaction product) of the chemical system
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    pub index: usize,
    pub identifier: String,
    pub role: Role,
}

/// parsed chemical system as far as the diagram setup needs it
#[derive(Debug, Clone, PartialEq)]
pub struct ChemSystem {
    pub components: Vec<Component>,
    /// species formed from the components; their index continues after the components
    pub products: Vec<Component>,
}

impl ChemSystem {
    pub fn new(
        components: &[String],
        products: &[String],
        classifier: &dyn RoleClassifier,
    ) -> Self {
        let components: Vec<Component> = components
            .iter()
            .enumerate()
            .map(|(index, id)| Component {
                index,
                identifier: id.trim().to_string(),
                role: classifier.classify(id),
            })
            .collect();
        let n = components.len();
        let products = products
            .iter()
            .enumerate()
            .map(|(i, id)| Component {
                index: n + i,
                identifier: id.trim().to_string(),
                role: classifier.classify(id),
            })
            .collect();
        Self {
            components,
            products,
        }
    }

    /// same as `new` with the identifier-based classifier
    pub fn from_identifiers(components: &[&str], products: &[&str]) -> Self {
        let components: Vec<String> = components.iter().map(|s| s.to_string()).collect();
        let products: Vec<String> = products.iter().map(|s| s.to_string()).collect();
        Self::new(&components, &products, &IdentifierClassifier)
    }

    pub fn n_components(&self) -> usize {
        self.components.len()
    }
    pub fn n_solid_components(&self) -> usize {
        self.components
            .iter()
            .filter(|c| c.role == Role::Solid)
            .count()
    }
    pub fn n_products(&self) -> usize {
        self.products.len()
    }
    pub fn n_species(&self) -> usize {
        self.components.len() + self.products.len()
    }

    pub fn component(&self, index: usize) -> Option<&Component> {
        self.components.get(index)
    }

    /// component or reaction product by species index
    pub fn species(&self, index: usize) -> Option<&Component> {
        if index < self.components.len() {
            self.components.get(index)
        } else {
            self.products.get(index - self.components.len())
        }
    }

    pub fn role(&self, index: usize) -> Option<Role> {
        self.component(index).map(|c| c.role)
    }

    pub fn name(&self, index: usize) -> &str {
        self.species(index).map_or("?", |c| c.identifier.as_str())
    }

    pub fn first_with_role(&self, role: Role) -> Option<usize> {
        self.components
            .iter()
            .find(|c| c.role == role)
            .map(|c| c.index)
    }

    pub fn proton(&self) -> Option<usize> {
        self.first_with_role(Role::Proton)
    }
    pub fn electron(&self) -> Option<usize> {
        self.first_with_role(Role::Electron)
    }
    pub fn water(&self) -> Option<usize> {
        self.first_with_role(Role::Water)
    }

    /// H+ present as a component or as a reaction product
    pub fn has_proton(&self) -> bool {
        self.components
            .iter()
            .chain(self.products.iter())
            .any(|c| c.role == Role::Proton)
    }
    /// e- present as a component or as a reaction product
    pub fn has_electron(&self) -> bool {
        self.components
            .iter()
            .chain(self.products.iter())
            .any(|c| c.role == Role::Electron)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_special_components() {
        let c = IdentifierClassifier;
        assert_eq!(c.classify("H+"), Role::Proton);
        assert_eq!(c.classify("e-"), Role::Electron);
        assert_eq!(c.classify("H2O"), Role::Water);
        assert!(c.is_proton(" H+ "));
        assert!(c.is_water("H2O(l)"));
    }

    #[test]
    fn test_classify_charges() {
        let c = IdentifierClassifier;
        assert_eq!(c.classify("Fe+3"), Role::Cation);
        assert_eq!(c.classify("Ca2+"), Role::Cation);
        assert_eq!(c.classify("Fe+++"), Role::Cation);
        assert_eq!(c.classify("Fe(OH)2+"), Role::Cation);
        assert_eq!(c.classify("Cl-"), Role::Anion);
        assert_eq!(c.classify("SO4-2"), Role::Anion);
        assert_eq!(c.classify("CO3--"), Role::Anion);
        assert_eq!(c.classify("NO3-"), Role::Anion);
        assert!(c.is_anion("HCO3-"));
    }

    #[test]
    fn test_classify_phases_and_neutral() {
        let c = IdentifierClassifier;
        assert_eq!(c.classify("CO2(g)"), Role::Gas);
        assert_eq!(c.classify("O2(G)"), Role::Gas);
        assert_eq!(c.classify("Fe(s)"), Role::Solid);
        assert_eq!(c.classify("CaCO3(cr)"), Role::Solid);
        assert_eq!(c.classify("SiO2(aq)"), Role::NeutralAqueous);
        assert_eq!(c.classify("Fe+2(aq)"), Role::Cation);
        assert_eq!(c.classify("H4SiO4"), Role::NeutralAqueous);
        assert!(c.is_neutral_aqueous("SiO2(aq)"));
        assert!(c.is_solid("Fe(s)"));
        assert!(c.is_gas("CO2(g)"));
        assert_eq!(c.classify(""), Role::NeutralAqueous);
    }

    #[test]
    fn test_chem_system_indices_and_presence() {
        let system = ChemSystem::from_identifiers(&["Cl-", "Fe+3", "H2O"], &["FeCl+2", "H+"]);
        assert_eq!(system.n_components(), 3);
        assert_eq!(system.n_products(), 2);
        assert_eq!(system.n_species(), 5);
        assert_eq!(system.n_solid_components(), 0);
        let with_solid = ChemSystem::from_identifiers(&["Ca+2", "CaCO3(cr)", "CO2(g)"], &[]);
        assert_eq!(with_solid.n_solid_components(), 1);
        assert_eq!(system.species(3).unwrap().identifier, "FeCl+2");
        assert_eq!(system.species(4).unwrap().index, 4);
        assert_eq!(system.proton(), None);
        assert!(system.has_proton());
        assert!(!system.has_electron());
        assert_eq!(system.water(), Some(2));
        assert_eq!(system.name(99), "?");
    }
}
