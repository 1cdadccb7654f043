//! The four built-in alias tables.
//!
//! Patterns run against the output of [`super::normalize_for_match`], so they
//! only ever see lowercase ASCII letters, digits and single spaces. Rule order
//! matters: more specific names sit above the generic ones they contain.

use std::sync::LazyLock;

use super::{AliasRule, AliasTable};

#[allow(clippy::expect_used)]
fn rule(pattern: &str, label: &'static str) -> AliasRule {
    AliasRule::new(pattern, label).expect("alias pattern is valid") // Static pattern, safe to panic
}

#[allow(clippy::expect_used)]
fn all_of(patterns: &[&str], label: &'static str) -> AliasRule {
    AliasRule::all_of(patterns, label).expect("alias pattern is valid") // Static pattern, safe to panic
}

/// Digital preservation services.
pub static PRESERVATION: LazyLock<AliasTable> = LazyLock::new(|| {
    AliasTable::new(
        "preservation",
        vec![
            rule(r"\bajol\b|\bafrican journals? online\b", "African Journals Online"),
            rule(r"\bzenodo\b|\bzenedo\b|\bzenodoo\b", "Zenodo"),
            rule(r"\bclockss\b", "CLOCKSS"),
            rule(r"\blockss\b", "LOCKSS"),
            rule(
                r"\bpkp\b.*\bpn\b|\bpkp preservation network\b",
                "PKP Preservation Network",
            ),
            rule(r"\bportico\b", "Portico"),
            rule(r"\bpubmed central\b|\bpmc\b", "PubMed Central"),
            rule(r"\binternet archive\b", "Internet Archive"),
            rule(r"\bcariniana\b", "Cariniana Network"),
            rule(r"\bscholars?\s*portal\b", "Scholars Portal"),
            rule(
                r"\bhrcak\b|\bhr cak\b|\bhr ak\b|portal of (croatian|scientific journals of croatia)",
                "Hrcak Portal of Croatian Scientific Journals",
            ),
            rule(
                r"\be\s*library\b|\belibrary\b|russian electronic scientific library",
                "eLIBRARY.RU",
            ),
            rule(r"\bmagiran\b", "Magiran"),
            rule(r"\bnoormags?\b", "Noormags"),
            rule(
                r"\bisc\b|\bislamic world science citation center\b",
                "Islamic World Science Citation Center",
            ),
            rule(
                r"\bscindeks\b|serbian citation index",
                "SCIndeks (Serbian Citation Index)",
            ),
            rule(r"\bcross\s*ref\b|\bcrossref\b", "CrossRef"),
            rule(r"\bkoreamed synapse\b", "KoreaMed Synapse"),
            rule(r"\bkoreamed\b", "KoreaMed"),
            rule(r"\bceeol\b", "CEEOL"),
            rule(r"\bcines\b", "CINES"),
            rule(r"\braco\b", "RACO"),
            rule(r"\bscholar\b.*\bportal\b", "Scholars Portal"),
            rule(
                r"\buniversity computing centre srce\b",
                "Hrcak Portal of Croatian Scientific Journals",
            ),
            rule(r"\bgoogle scholar\b", "Google Scholar"),
            rule(r"\bsid\b", "SID"),
            rule(
                r"\bniscpr online periodicals repository\b",
                "NIScPR Online Periodicals Repository",
            ),
            rule(r"\bin[- ]?house archiving\b", "In-house Archiving"),
            rule(
                r"\bjournal'?s?\s+website\b|\bjournal\s+website\b",
                "Journal Website",
            ),
            rule(
                r"\bnational digital archives of iranian scholarly journals\b",
                "National Digital Archives of Iranian Scholarly Journals",
            ),
            rule(r"\be\s*depot\b", "E-Depot"),
            rule(
                r"\bnational library of the netherlands\b|\bkoninklijke bibliotheek\b|\bkb\b",
                "KB National Library of the Netherlands",
            ),
        ],
    )
    .expanding_parenthetical()
});

/// Persistent article identifier schemes.
pub static PID_SCHEME: LazyLock<AliasTable> = LazyLock::new(|| {
    AliasTable::new(
        "pid_scheme",
        vec![
            rule(
                r"\bcross\s*ref\b|\bcrossref\b|\bcrossreff\b|\bcrossref doi\b|\bdoi.*crossref\b|\bcrossref.*doi\b",
                "CrossRef",
            ),
            rule(r"\bdata\s*cite\b|\bdatacite\b|\bdatacitee\b", "DataCite"),
            rule(r"\borcid\b", "ORCID"),
            rule(r"\bpmcid\b", "PMCID"),
            rule(r"\bpmid\b", "PMID"),
            rule(r"\bissn\b", "ISSN"),
            rule(r"\bdoi\b", "DOI"),
            rule(r"\bark\b", "ARK"),
            rule(r"\burn\b", "URN"),
            rule(r"\bhandle\b", "Handle"),
        ],
    )
});

/// Peer review processes.
pub static PEER_REVIEW: LazyLock<AliasTable> = LazyLock::new(|| {
    AliasTable::new(
        "peer_review",
        vec![
            rule(
                r"\bpartial\b.*\bdouble\b.*\b(anonymous|blind)\b|\bdouble\b.*\b(anonymous|blind)\b",
                "Double anonymous peer review",
            ),
            rule(
                r"\btriple\b.*\b(anonymous|blind)\b",
                "Triple anonymous peer review",
            ),
            rule(
                r"\bopen peer commentary\b|\bopen\b.*\bpeer\b.*\breview\b",
                "Open peer review",
            ),
            rule(
                r"\bpost publication\b.*\bpeer\b.*\breview\b",
                "Post-publication peer review",
            ),
            rule(r"\bcrowd\b.*\breview\b", "Crowd review"),
            rule(r"\bcommittee\b.*\breview\b", "Committee review"),
            rule(
                r"\b(editorial review|collaborative editorial)\b",
                "Editorial review",
            ),
            rule(
                r"\b(single|anonymous|blind)\b.*\bpeer\b.*\breview\b|\banonymous peer review\b",
                "Anonymous peer review",
            ),
            rule(r"\bpeer\b.*\breview\b", "Peer review"),
        ],
    )
});

/// Deposit policy directories.
pub static DEPOSIT_POLICY: LazyLock<AliasTable> = LazyLock::new(|| {
    AliasTable::new(
        "deposit_policy",
        vec![
            rule(
                r"\bopen policy finder\b|\bsherpa\s*romeo\b",
                "Open Policy Finder",
            ),
            rule(r"\bdiadorim\b", "Diadorim"),
            rule(r"\bdulcinea\b", "Dulcinea"),
            rule(r"\bmir\s*bel\b|\bmirabel\b", "Mir@bel"),
            rule(r"\bmalena\b", "Malena"),
            rule(r"\baura\b", "AURA"),
            rule(r"\bdergipark\b", "DergiPark"),
            rule(r"\bgaruda\b|\bgarba rujukan digital\b", "Garuda"),
            rule(
                r"\bpulisher\b.*\b(site|website)\b|\bpublisher\b.*\bown\b.*\b(site|website)\b|\bpublisher\b.*\b(site|website)\b",
                "Publisher's own site",
            ),
            rule(
                r"\bjournal\b.*\bown\b.*\b(site|website)\b|\bjournal own website\b",
                "Journal's own site",
            ),
            rule(r"\bjournal\b.*\b(site|website)\b", "Journal website"),
            rule(
                r"\bpreprint\b.*\bpostprint\b.*\bpolicy\b",
                "Preprint and postprint policy",
            ),
            rule(r"\bself\b.*\barchiving\b", "Self-archiving policy"),
            rule(r"\brepository\b.*\bpolicy\b", "Repository policy"),
            rule(r"\bin[- ]?house\b.*\brepository\b", "In-house repository"),
            rule(r"\bcopyright\b", "Copyright notice"),
            rule(r"\bauthors?\b.*\brights?\b", "Authors' rights"),
            rule(
                r"\binstitutional\b.*\brepository\b",
                "Institutional repository",
            ),
            rule(r"\bbrill\b", "Brill.com"),
            rule(r"\bour own site\b", "Publisher's own site"),
            rule(
                r"\bpublic and\s+or commercial subject based repositories\b",
                "Public and/or commercial subject-based repositories",
            ),
            rule(
                r"\bkarger permits authors of open access articles\b",
                "Karger policy statement",
            ),
            rule(r"\bcross\s*ref\b|\bcrossref\b", "CrossRef"),
        ],
    )
    .with_fallbacks(vec![
        all_of(&[r"\bpublisher\b", r"\b(site|website)\b"], "Publisher's own site"),
        all_of(&[r"\bjournal\b", r"\b(site|website)\b"], "Journal website"),
    ])
});

#[cfg(test)]
mod tests {
    use super::*;

    fn canonical(table: &AliasTable, value: &str) -> Option<String> {
        table.canonicalize(value)
    }

    // ==================== Preservation ====================

    #[test]
    fn test_preservation_aliases() {
        let cases = [
            ("CLOCKSS", "CLOCKSS"),
            ("lockss", "LOCKSS"),
            ("PKP PN", "PKP Preservation Network"),
            ("PKP Preservation Network", "PKP Preservation Network"),
            ("Zenedo", "Zenodo"),
            ("PMC", "PubMed Central"),
            ("Scholar's Portal", "Scholars Portal"),
            ("Hrčak", "Hrcak Portal of Croatian Scientific Journals"),
            ("e-Library", "eLIBRARY.RU"),
            ("KoreaMed Synapse", "KoreaMed Synapse"),
            ("Koninklijke Bibliotheek", "KB National Library of the Netherlands"),
            ("in-house archiving", "In-house Archiving"),
        ];
        for (input, expected) in cases {
            assert_eq!(canonical(&PRESERVATION, input).as_deref(), Some(expected), "{input}");
        }
    }

    #[test]
    fn test_preservation_prefers_parenthetical_expansion() {
        assert_eq!(
            canonical(&PRESERVATION, "NLW (National Library of Wales)").as_deref(),
            Some("National Library of Wales")
        );
        // Single-word parentheticals are not expansions.
        assert_eq!(
            canonical(&PRESERVATION, "national archive (wales)").as_deref(),
            Some("National Archive (Wales)")
        );
    }

    // ==================== PID ====================

    #[test]
    fn test_pid_aliases() {
        let cases = [
            ("DOI via Crossref", "CrossRef"),
            ("Cross Ref", "CrossRef"),
            ("doi", "DOI"),
            ("Data Cite", "DataCite"),
            ("handle", "Handle"),
            ("ark:", "ARK"),
        ];
        for (input, expected) in cases {
            assert_eq!(canonical(&PID_SCHEME, input).as_deref(), Some(expected), "{input}");
        }
        assert_eq!(canonical(&PID_SCHEME, "none").as_deref(), Some("None"));
    }

    // ==================== Peer review ====================

    #[test]
    fn test_peer_review_double_blind() {
        assert_eq!(
            canonical(&PEER_REVIEW, "Double Blind Peer Review").as_deref(),
            Some("Double anonymous peer review")
        );
    }

    #[test]
    fn test_peer_review_order_prefers_specific_rules() {
        let cases = [
            ("Triple blind peer review", "Triple anonymous peer review"),
            ("Open peer review", "Open peer review"),
            ("Post publication peer review", "Post-publication peer review"),
            ("Editorial review", "Editorial review"),
            ("Blind peer review", "Anonymous peer review"),
            ("Peer review", "Peer review"),
        ];
        for (input, expected) in cases {
            assert_eq!(canonical(&PEER_REVIEW, input).as_deref(), Some(expected), "{input}");
        }
    }

    // ==================== Deposit policy ====================

    #[test]
    fn test_deposit_policy_aliases() {
        let cases = [
            ("Sherpa/Romeo", "Open Policy Finder"),
            ("Mir@bel", "Mir@bel"),
            ("Journal own website", "Journal's own site"),
            ("Self-archiving", "Self-archiving policy"),
        ];
        for (input, expected) in cases {
            assert_eq!(canonical(&DEPOSIT_POLICY, input).as_deref(), Some(expected), "{input}");
        }
    }

    #[test]
    fn test_deposit_policy_structural_fallbacks() {
        assert_eq!(
            canonical(&DEPOSIT_POLICY, "Site of the publisher").as_deref(),
            Some("Publisher's own site")
        );
        assert_eq!(
            canonical(&DEPOSIT_POLICY, "Website of the journal").as_deref(),
            Some("Journal website")
        );
        assert_eq!(
            canonical(&DEPOSIT_POLICY, "unknown directory").as_deref(),
            Some("Unknown Directory")
        );
    }
}
