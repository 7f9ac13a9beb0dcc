use config_composer::Target;

#[cfg(test)]
#[path = "targets_cmd_tests.rs"]
mod tests;

/// One line per supported target: the target and its display name, if any.
pub fn target_lines() -> Vec<String> {
    Target::ALL
        .iter()
        .map(|target| {
            let name = target.display_name();
            if name.is_empty() {
                target.as_str().to_string()
            } else {
                format!("{:<18} {}", target.as_str(), name)
            }
        })
        .collect()
}

/// Execute the targets command
pub fn execute() {
    for line in target_lines() {
        println!("{}", line);
    }
}
