//! Formatting helpers for presenting metrics.
//!
//! Rounding happens here and nowhere else; stored values keep full precision.

pub fn format_score(value: f64) -> String {
    format!("{value:.1}")
}

pub fn format_percent(value: f64) -> String {
    format!("{value:.1}%")
}

/// Renders a cell number the way a spreadsheet user typed it: integers without
/// a trailing `.0`, everything else as-is.
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

/// Suggested download name: `{solver}_Report.pdf`. Letters and digits of any
/// script are kept, along with `.` and `-`; whitespace and everything else
/// fold into single underscores.
pub fn report_filename(solver_name: &str, extension: &str) -> String {
    let mut stem = String::with_capacity(solver_name.len());
    let mut pending_sep = false;

    for ch in solver_name.trim().chars() {
        if ch.is_alphanumeric() || ch == '-' || ch == '.' {
            if pending_sep && !stem.is_empty() {
                stem.push('_');
            }
            pending_sep = false;
            stem.push(ch);
        } else {
            pending_sep = true;
        }
    }

    let stem = stem.trim_matches(|c| c == '.' || c == '_');
    let stem = if stem.is_empty() { "Unnamed_Solver" } else { stem };
    format!("{stem}_Report.{extension}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_decimal_at_presentation() {
        assert_eq!(format_percent(90.0 / 99.0 * 100.0), "90.9%");
        assert_eq!(format_score(3.25), "3.2");
        assert_eq!(format_score(4.0), "4.0");
    }

    #[test]
    fn numbers_drop_trailing_zero() {
        assert_eq!(format_number(12.0), "12");
        assert_eq!(format_number(3.5), "3.5");
    }

    #[test]
    fn filename_sanitises_whitespace_and_separators() {
        assert_eq!(report_filename("Amina  Wanjiru", "pdf"), "Amina_Wanjiru_Report.pdf");
        assert_eq!(report_filename("../etc/passwd", "pdf"), "etc_passwd_Report.pdf");
        assert_eq!(report_filename("Jean-Luc O'Neil", "pdf"), "Jean-Luc_O_Neil_Report.pdf");
    }

    #[test]
    fn filename_falls_back_when_nothing_survives() {
        assert_eq!(report_filename("  ", "pdf"), "Unnamed_Solver_Report.pdf");
        assert_eq!(report_filename("/\\:*?", "pdf"), "Unnamed_Solver_Report.pdf");
    }

    #[test]
    fn filename_keeps_letters_of_any_script() {
        assert_eq!(report_filename("李雷", "pdf"), "李雷_Report.pdf");
        assert_eq!(report_filename("Zoë Ндлову", "pdf"), "Zoë_Ндлову_Report.pdf");
        assert_eq!(report_filename("Zoë/Ндлову\u{0}", "pdf"), "Zoë_Ндлову_Report.pdf");
    }
}
