use rca_protocol::Incident;

/// Join every non-blank incident field, in declaration order, into one
/// dense retrieval query. Pure; an all-empty incident yields the empty
/// string, which the store treats as a degenerate (but valid) query.
pub fn build_query(incident: &Incident) -> String {
    incident
        .field_values()
        .iter()
        .filter_map(|v| v.as_deref())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" | ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn joins_populated_fields_in_declaration_order() {
        let incident = Incident {
            material: Some("Carbon steel".to_string()),
            asset_type: Some("Pipeline".to_string()),
            observed_damage: Some("Localized pitting".to_string()),
            ..Default::default()
        };
        assert_eq!(
            build_query(&incident),
            "Pipeline | Carbon steel | Localized pitting"
        );
    }

    #[test]
    fn empty_incident_yields_empty_query() {
        assert_eq!(build_query(&Incident::default()), "");
    }

    #[test]
    fn blank_fields_are_skipped() {
        let incident = Incident {
            material: Some("  ".to_string()),
            service: Some("Wet CO2".to_string()),
            ..Default::default()
        };
        assert_eq!(build_query(&incident), "Wet CO2");
    }
}
