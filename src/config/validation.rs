//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check referential integrity (dependencies reference existing services)
//! - Detect dependency cycles
//! - Enforce run-once semantics for volume preparation units
//! - Check subpath validity and disjointness, port conflicts, bind addresses
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: StackConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;

use crate::config::schema::{RestartPolicy, RunSpec, StackConfig};
use crate::volume::layout::{subpaths_overlap, valid_subpath_name};

/// A single semantic problem found in a stack definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// The config location the problem was found at (service or section).
    pub context: String,
    /// Human-readable description of the problem.
    pub message: String,
}

impl ValidationError {
    fn new(context: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            context: context.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.context, self.message)
    }
}

/// Validate a stack definition, collecting every problem found.
pub fn validate_config(config: &StackConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_services(config, &mut errors);
    check_dependencies(config, &mut errors);
    check_subpaths(config, &mut errors);
    check_ports(config, &mut errors);
    check_addresses(config, &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_services(config: &StackConfig, errors: &mut Vec<ValidationError>) {
    let mut seen = HashSet::new();
    for service in &config.services {
        if service.name.is_empty() {
            errors.push(ValidationError::new("services", "service name is empty"));
            continue;
        }
        if !seen.insert(service.name.as_str()) {
            errors.push(ValidationError::new(
                &service.name,
                "duplicate service name",
            ));
        }
        match &service.run {
            RunSpec::Exec { command } if command.is_empty() => {
                errors.push(ValidationError::new(&service.name, "exec command is empty"));
            }
            RunSpec::PrepareVolume if service.restart != RestartPolicy::No => {
                errors.push(ValidationError::new(
                    &service.name,
                    "volume preparation units are run-once and require restart = \"no\"",
                ));
            }
            _ => {}
        }
    }
}

fn check_dependencies(config: &StackConfig, errors: &mut Vec<ValidationError>) {
    let names: HashSet<&str> = config.services.iter().map(|s| s.name.as_str()).collect();

    for service in &config.services {
        for dep in &service.depends_on {
            if dep == &service.name {
                errors.push(ValidationError::new(
                    &service.name,
                    "service depends on itself",
                ));
            } else if !names.contains(dep.as_str()) {
                errors.push(ValidationError::new(
                    &service.name,
                    format!("depends on unknown service \"{}\"", dep),
                ));
            }
        }
    }

    if let Some(cycle) = find_cycle(config) {
        errors.push(ValidationError::new(
            "services",
            format!("dependency cycle: {}", cycle.join(" -> ")),
        ));
    }
}

/// Depth-first search for a cycle in the dependency graph. Returns the first
/// cycle found as a service name path.
fn find_cycle(config: &StackConfig) -> Option<Vec<String>> {
    let graph: HashMap<&str, &[String]> = config
        .services
        .iter()
        .map(|s| (s.name.as_str(), s.depends_on.as_slice()))
        .collect();

    let mut visited = HashSet::new();
    let mut stack = Vec::new();

    fn visit<'a>(
        node: &'a str,
        graph: &HashMap<&'a str, &'a [String]>,
        visited: &mut HashSet<&'a str>,
        stack: &mut Vec<&'a str>,
    ) -> Option<Vec<String>> {
        if let Some(pos) = stack.iter().position(|n| *n == node) {
            let mut cycle: Vec<String> = stack[pos..].iter().map(|n| n.to_string()).collect();
            cycle.push(node.to_string());
            return Some(cycle);
        }
        if !visited.insert(node) {
            return None;
        }
        stack.push(node);
        if let Some(deps) = graph.get(node) {
            for dep in deps.iter() {
                if graph.contains_key(dep.as_str()) {
                    if let Some(cycle) = visit(dep, graph, visited, stack) {
                        return Some(cycle);
                    }
                }
            }
        }
        stack.pop();
        None
    }

    for service in &config.services {
        if let Some(cycle) = visit(service.name.as_str(), &graph, &mut visited, &mut stack) {
            return Some(cycle);
        }
    }
    None
}

fn check_subpaths(config: &StackConfig, errors: &mut Vec<ValidationError>) {
    let subpaths = &config.volume.subpaths;

    for subpath in subpaths {
        if !valid_subpath_name(&subpath.name) {
            errors.push(ValidationError::new(
                "volume",
                format!("invalid subpath name \"{}\"", subpath.name),
            ));
        }
    }

    for (i, a) in subpaths.iter().enumerate() {
        for b in &subpaths[i + 1..] {
            if subpaths_overlap(&a.name, &b.name) {
                errors.push(ValidationError::new(
                    "volume",
                    format!("subpaths \"{}\" and \"{}\" overlap", a.name, b.name),
                ));
            }
        }
    }
}

fn check_ports(config: &StackConfig, errors: &mut Vec<ValidationError>) {
    let mut claimed: HashMap<u16, &str> = HashMap::new();
    for service in &config.services {
        for port in &service.ports {
            match claimed.get(port) {
                Some(other) => errors.push(ValidationError::new(
                    &service.name,
                    format!("port {} already published by \"{}\"", port, other),
                )),
                None => {
                    claimed.insert(*port, service.name.as_str());
                }
            }
        }
    }
}

fn check_addresses(config: &StackConfig, errors: &mut Vec<ValidationError>) {
    if config.status.enabled && config.status.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "status",
            format!("invalid bind address \"{}\"", config.status.bind_address),
        ));
    }
    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError::new(
            "observability",
            format!(
                "invalid metrics address \"{}\"",
                config.observability.metrics_address
            ),
        ));
    }
}
