//! The read-eval-print loop.
use crate::tutor::router::Tutor;
use log::info;
use std::io::{self, BufRead, Write};

pub const WELCOME: &str = "Welcome to Enhanced Math AI Tutor! Solve, differentiate, integrate, find limits, simplify. Add 'plot' for visuals. Type 'exit' to quit.";
pub const PROMPT: &str = "You: ";
pub const FAREWELL: &str = "Goodbye! Happy studying.";
pub const EXIT_COMMAND: &str = "exit";

/// Answers one line at a time until `exit` or the end of input. Only I/O errors stop it.
pub fn run_session<R: BufRead, W: Write>(tutor: &Tutor, mut input: R, mut output: W) -> io::Result<()> {
    writeln!(output, "{}", WELCOME)?;
    let mut line = String::new();
    let mut answered = 0usize;
    loop {
        write!(output, "{}", PROMPT)?;
        output.flush()?;
        line.clear();
        if input.read_line(&mut line)? == 0 {
            writeln!(output)?;
            break;
        }
        let query = line.trim_end_matches(['\n', '\r']);
        if query.eq_ignore_ascii_case(EXIT_COMMAND) {
            writeln!(output, "{}", FAREWELL)?;
            break;
        }
        writeln!(output, "AI Tutor: {}", tutor.respond(query))?;
        answered += 1;
    }
    info!("session ended after {} queries", answered);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Utils::config::TutorConfig;
    use crate::tutor::response::HELP;

    fn transcript(input: &str) -> String {
        let tutor = Tutor::new(&TutorConfig::default());
        let mut output = Vec::new();
        run_session(&tutor, input.as_bytes(), &mut output).unwrap();
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn test_exit_ends_session() {
        let out = transcript("EXIT\nsimplify x + x\n");
        assert_eq!(out, format!("{}\nYou: {}\n", WELCOME, FAREWELL));
    }

    #[test]
    fn test_session_survives_bad_queries() {
        let out = transcript("hello\ndifferentiate sin(x\nsimplify x + x\nexit\n");
        let answers: Vec<&str> = out.lines().filter(|l| l.starts_with("You: AI Tutor: ")).collect();
        assert_eq!(answers.len(), 3);
        assert_eq!(answers[0], format!("You: AI Tutor: {}", HELP));
        assert!(answers[1].contains("Error: could not differentiate 'sin(x'"));
        assert!(answers[2].starts_with("You: AI Tutor: Result: 2*x."));
        assert!(out.ends_with(&format!("You: {}\n", FAREWELL)));
    }

    #[test]
    fn test_only_exact_exit_ends_session() {
        let out = transcript("exit now\n exit\r\nExit\r\n");
        assert_eq!(out.matches(HELP).count(), 2);
        assert!(out.ends_with(&format!("You: {}\n", FAREWELL)));
    }

    #[test]
    fn test_end_of_input_ends_session() {
        let out = transcript("simplify x + x\n");
        assert!(out.contains("AI Tutor: Result: 2*x."));
        assert!(!out.contains(FAREWELL));
        assert!(out.ends_with("You: \n"));
    }
}
