use indexmap::IndexMap;

pub const FALLBACK_GROUP: &str = "Additional tactics";

struct TacticGroup {
    label: &'static str,
    keywords: &'static [&'static str],
}

const TACTIC_GROUPS: &[TacticGroup] = &[
    TacticGroup {
        label: "Recon & Prep",
        keywords: &["reconnaissance", "resource development"],
    },
    TacticGroup {
        label: "Initial Access",
        keywords: &["initial access"],
    },
    TacticGroup {
        label: "Execution",
        keywords: &["execution"],
    },
    TacticGroup {
        label: "Persistence",
        keywords: &["persistence"],
    },
    TacticGroup {
        label: "Privilege Escalation",
        keywords: &["privilege escalation"],
    },
    TacticGroup {
        label: "Defense Evasion",
        keywords: &["defense evasion"],
    },
    TacticGroup {
        label: "Credential Access",
        keywords: &["credential access"],
    },
    TacticGroup {
        label: "Discovery",
        keywords: &["discovery"],
    },
    TacticGroup {
        label: "Lateral Movement",
        keywords: &["lateral movement"],
    },
    TacticGroup {
        label: "Collection",
        keywords: &["collection"],
    },
    TacticGroup {
        label: "Command & Control",
        keywords: &["command and control"],
    },
    TacticGroup {
        label: "Exfiltration & Impact",
        keywords: &["exfiltration", "impact"],
    },
];

pub fn resolve_tactic_group(tactic: &str) -> &'static str {
    let normalized = tactic.to_lowercase();
    TACTIC_GROUPS
        .iter()
        .find(|group| {
            group
                .keywords
                .iter()
                .any(|keyword| normalized.contains(keyword))
        })
        .map(|group| group.label)
        .unwrap_or(FALLBACK_GROUP)
}

/// Cluster tactic names under their ATT&CK phase label. Labels are ordered
/// alphabetically and so are the tactics inside each label.
pub fn group_tactics<I, S>(tactics: I) -> IndexMap<&'static str, Vec<String>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut groups: IndexMap<&'static str, Vec<String>> = IndexMap::new();
    for tactic in tactics {
        let tactic = tactic.as_ref();
        groups
            .entry(resolve_tactic_group(tactic))
            .or_default()
            .push(tactic.to_string());
    }
    for members in groups.values_mut() {
        members.sort_by_key(|name| name.to_lowercase());
        members.dedup();
    }
    groups.sort_unstable_keys();
    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_groups_by_keyword() {
        assert_eq!(resolve_tactic_group("Command and Control"), "Command & Control");
        assert_eq!(resolve_tactic_group("impact"), "Exfiltration & Impact");
        assert_eq!(resolve_tactic_group("Resource Development"), "Recon & Prep");
        assert_eq!(resolve_tactic_group("Sorcery"), FALLBACK_GROUP);
    }

    #[test]
    fn groups_are_sorted_by_label_and_member() {
        let groups = group_tactics(["Persistence", "Exfiltration", "Impact", "Sorcery"]);
        let labels: Vec<_> = groups.keys().copied().collect();
        assert_eq!(
            labels,
            vec!["Additional tactics", "Exfiltration & Impact", "Persistence"]
        );
        assert_eq!(groups["Exfiltration & Impact"], vec!["Exfiltration", "Impact"]);
    }
}
