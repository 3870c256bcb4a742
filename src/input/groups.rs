//! Explicit parameter-to-response grouping for multivariate models.

use indexmap::IndexMap;

use super::{ParameterTable, TableError};

/// Maps parameter names to a group key (typically a response variable).
///
/// Group order is the order in which groups are first assigned.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterGroups {
    assignments: IndexMap<String, String>,
}

impl ParameterGroups {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a grouping from `(parameter, group)` pairs.
    ///
    /// # Errors
    ///
    /// Returns `TableError::ConflictingGroup` if one parameter is assigned to
    /// two different groups.
    pub fn from_assignments<I, P, G>(assignments: I) -> Result<Self, TableError>
    where
        I: IntoIterator<Item = (P, G)>,
        P: Into<String>,
        G: Into<String>,
    {
        let mut groups = Self::new();
        for (parameter, group) in assignments {
            groups.assign(parameter, group)?;
        }
        Ok(groups)
    }

    /// Assign `parameter` to `group`. Re-assigning to the same group is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `TableError::ConflictingGroup` if the parameter already belongs
    /// to another group.
    pub fn assign(
        &mut self,
        parameter: impl Into<String>,
        group: impl Into<String>,
    ) -> Result<(), TableError> {
        let parameter = parameter.into();
        let group = group.into();
        match self.assignments.get(&parameter) {
            Some(existing) if *existing != group => Err(TableError::ConflictingGroup {
                name: parameter,
                existing: existing.clone(),
                requested: group,
            }),
            Some(_) => Ok(()),
            None => {
                self.assignments.insert(parameter, group);
                Ok(())
            }
        }
    }

    #[must_use]
    pub fn group_of(&self, parameter: &str) -> Option<&str> {
        self.assignments.get(parameter).map(String::as_str)
    }

    /// Distinct group keys in first-assigned order.
    #[must_use]
    pub fn groups(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for group in self.assignments.values() {
            if !seen.contains(&group.as_str()) {
                seen.push(group);
            }
        }
        seen
    }

    #[must_use]
    pub fn members(&self, group: &str) -> Vec<&str> {
        self.assignments
            .iter()
            .filter(|(_, assigned)| assigned.as_str() == group)
            .map(|(parameter, _)| parameter.as_str())
            .collect()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    /// Split `table` into one sub-table per group, in group order.
    ///
    /// Columns keep their table order within each group. Groups with no
    /// column in `table` are skipped.
    ///
    /// # Errors
    ///
    /// Returns `TableError::UngroupedParameter` if a table column has no group.
    pub fn split(
        &self,
        table: &ParameterTable,
    ) -> Result<Vec<(String, ParameterTable)>, TableError> {
        if let Some(name) = table.names().find(|name| self.group_of(name).is_none()) {
            return Err(TableError::UngroupedParameter {
                name: name.to_string(),
            });
        }

        let mut parts = Vec::new();
        for group in self.groups() {
            let columns: Vec<&str> = table
                .names()
                .filter(|name| self.group_of(name) == Some(group))
                .collect();
            if columns.is_empty() {
                continue;
            }
            parts.push((group.to_string(), table.select_columns(columns.as_slice())?));
        }
        Ok(parts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn multivariate_table() -> ParameterTable {
        ParameterTable::from_columns(vec![
            ("b_y1_Intercept", vec![0.0, 0.1]),
            ("b_y2_Intercept", vec![5.0, 5.1]),
            ("b_y1_x", vec![1.0, 1.1]),
        ])
        .expect("table")
    }

    #[test]
    fn assign_rejects_conflicting_groups() {
        let mut groups = ParameterGroups::new();
        groups.assign("b_x", "y1").expect("first assignment");
        groups.assign("b_x", "y1").expect("same group is fine");
        let err = groups.assign("b_x", "y2").expect_err("conflict");
        assert!(matches!(err, TableError::ConflictingGroup { .. }));
    }

    #[test]
    fn groups_keep_first_seen_order() {
        let groups = ParameterGroups::from_assignments(vec![
            ("b_y2_Intercept", "y2"),
            ("b_y1_Intercept", "y1"),
            ("b_y1_x", "y1"),
        ])
        .expect("groups");
        assert_eq!(groups.groups(), vec!["y2", "y1"]);
        assert_eq!(groups.members("y1"), vec!["b_y1_Intercept", "b_y1_x"]);
    }

    #[test]
    fn split_partitions_columns_by_group() {
        let groups = ParameterGroups::from_assignments(vec![
            ("b_y1_Intercept", "y1"),
            ("b_y1_x", "y1"),
            ("b_y2_Intercept", "y2"),
        ])
        .expect("groups");
        let parts = groups.split(&multivariate_table()).expect("split");
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].0, "y1");
        assert_eq!(
            parts[0].1.names().collect::<Vec<_>>(),
            vec!["b_y1_Intercept", "b_y1_x"]
        );
        assert_eq!(parts[1].1.names().collect::<Vec<_>>(), vec!["b_y2_Intercept"]);
    }

    #[test]
    fn split_rejects_ungrouped_columns() {
        let groups =
            ParameterGroups::from_assignments(vec![("b_y1_Intercept", "y1")]).expect("groups");
        let err = groups
            .split(&multivariate_table())
            .expect_err("ungrouped column");
        assert!(matches!(err, TableError::UngroupedParameter { .. }));
    }
}
