//! Plain-text rendering of reports and recognition results.
//!
//! Output labels stay in French to match the deployed system.

use presence_api::{AttendanceReport, HealthStatus, RecognitionResult, RecognitionStatus};
use std::fmt::Write;

/// Render the attendance snapshot: one row per student, a summary
/// line, and the statistics block when the backend provides one.
pub fn render_report(report: &AttendanceReport) -> String {
    let mut out = String::new();
    out.push_str("Étudiant\tStatut\n");
    for student in &report.present {
        let _ = writeln!(out, "{student}\tPrésent");
    }
    for student in &report.absent {
        let _ = writeln!(out, "{student}\tAbsent");
    }

    let _ = write!(
        out,
        "\nPrésents: {} | Absents: {}\n",
        report.count,
        report.absent.len()
    );

    if let Some(stats) = &report.statistics {
        let _ = write!(
            out,
            "Total: {} | Taux: {:.2}%\n",
            stats.total_students, stats.attendance_rate
        );
    }

    out
}

/// Render recognition results, one line per detected face.
pub fn render_results(results: &[RecognitionResult]) -> String {
    let mut out = String::new();
    for result in results {
        match result.status {
            RecognitionStatus::Recognized => {
                let label = result.label.as_deref().unwrap_or("inconnu");
                let confidence = result.confidence.unwrap_or(0.0) * 100.0;
                let _ = writeln!(out, "✅ {label} (confiance: {confidence:.2}%)");
            }
            RecognitionStatus::Unknown => {
                let _ = writeln!(out, "❌ Visage inconnu");
            }
        }
    }
    out
}

pub fn render_students(students: &[String]) -> String {
    let mut out = String::new();
    for student in students {
        let _ = writeln!(out, "{student}");
    }
    let _ = write!(out, "\nÉtudiants connus: {}\n", students.len());
    out
}

pub fn render_health(health: &HealthStatus) -> String {
    format!(
        "Statut: {}\nModèles chargés: {}\nÉtudiants connus: {}\nPrésences en cours: {}\n",
        health.status,
        if health.models_loaded { "oui" } else { "non" },
        health.known_students_count,
        health.current_attendance
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use presence_api::Statistics;

    fn alice_bob_report() -> AttendanceReport {
        AttendanceReport {
            present: vec!["Alice".into()],
            absent: vec!["Bob".into()],
            count: 1,
            statistics: None,
        }
    }

    #[test]
    fn test_report_rows_and_summary() {
        let rendered = render_report(&alice_bob_report());

        let present_rows: Vec<&str> = rendered
            .lines()
            .filter(|l| l.ends_with("\tPrésent"))
            .collect();
        let absent_rows: Vec<&str> = rendered
            .lines()
            .filter(|l| l.ends_with("\tAbsent"))
            .collect();

        assert_eq!(present_rows, ["Alice\tPrésent"]);
        assert_eq!(absent_rows, ["Bob\tAbsent"]);
        assert!(rendered.contains("Présents: 1 | Absents: 1"));
    }

    #[test]
    fn test_report_statistics_block() {
        let mut report = alice_bob_report();
        report.statistics = Some(Statistics {
            total_students: 2,
            present: 1,
            absent: 1,
            attendance_rate: 50.0,
        });
        let rendered = render_report(&report);
        assert!(rendered.contains("Total: 2 | Taux: 50.00%"));
    }

    #[test]
    fn test_empty_report() {
        let rendered = render_report(&AttendanceReport {
            present: vec![],
            absent: vec![],
            count: 0,
            statistics: None,
        });
        assert!(rendered.contains("Présents: 0 | Absents: 0"));
        assert!(!rendered.contains("\tPrésent\n"));
    }

    #[test]
    fn test_results_lines() {
        let results = vec![
            RecognitionResult {
                status: RecognitionStatus::Recognized,
                label: Some("Alice".into()),
                confidence: Some(0.935),
            },
            RecognitionResult {
                status: RecognitionStatus::Unknown,
                label: None,
                confidence: None,
            },
        ];
        let rendered = render_results(&results);
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "✅ Alice (confiance: 93.50%)");
        assert_eq!(lines[1], "❌ Visage inconnu");
    }

    #[test]
    fn test_students_list() {
        let rendered = render_students(&["Alice".into(), "Bob".into()]);
        assert!(rendered.contains("Alice\n"));
        assert!(rendered.contains("Étudiants connus: 2"));
    }

    #[test]
    fn test_health() {
        let rendered = render_health(&HealthStatus {
            status: "healthy".into(),
            models_loaded: true,
            known_students_count: 12,
            current_attendance: 3,
        });
        assert!(rendered.contains("Modèles chargés: oui"));
        assert!(rendered.contains("Étudiants connus: 12"));
    }
}
