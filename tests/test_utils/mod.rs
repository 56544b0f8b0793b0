//! Test utilities and fixtures for canopy tests

#![allow(dead_code)]

use canopy::data::{Dependency, DependencyType, Issue, IssueType, Status};
use canopy::tree::TreeModel;
use chrono::{TimeZone, Utc};

/// An open task created on 2024-01-01.
pub fn make_issue(id: &str, title: &str) -> Issue {
    Issue {
        id: id.to_string(),
        title: title.to_string(),
        description: None,
        status: Status::Open,
        priority: 2,
        issue_type: IssueType::Task,
        created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        updated_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        closed_at: None,
        labels: Vec::new(),
        dependencies: Vec::new(),
    }
}

pub fn make_child(id: &str, title: &str, parent: &str) -> Issue {
    with_edge(make_issue(id, title), parent, DependencyType::ParentChild)
}

pub fn with_edge(mut issue: Issue, target: &str, dep_type: DependencyType) -> Issue {
    issue.dependencies.push(Dependency {
        issue_id: issue.id.clone(),
        depends_on_id: target.to_string(),
        dep_type,
    });
    issue
}

pub fn with_status(mut issue: Issue, status: Status) -> Issue {
    issue.status = status;
    issue
}

pub fn with_type(mut issue: Issue, issue_type: IssueType) -> Issue {
    issue.issue_type = issue_type;
    issue
}

pub fn with_priority(mut issue: Issue, priority: i32) -> Issue {
    issue.priority = priority;
    issue
}

/// Set the creation day (January 2024).
pub fn created_on(mut issue: Issue, day: u32) -> Issue {
    issue.created_at = Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap();
    issue.updated_at = issue.created_at;
    issue
}

/// `epic -> task -> subtask`, the smallest three-level hierarchy.
pub fn make_three_levels() -> Vec<Issue> {
    vec![
        with_type(make_issue("epic", "Epic"), IssueType::Epic),
        make_child("task", "Task", "epic"),
        make_child("subtask", "Subtask", "task"),
    ]
}

pub fn make_model(issues: &[Issue]) -> TreeModel {
    let mut model = TreeModel::new();
    model.build(issues);
    model
}

/// Identifiers of the displayed rows.
pub fn ids(model: &TreeModel) -> Vec<String> {
    model.visible_ids().into_iter().map(String::from).collect()
}

pub fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
