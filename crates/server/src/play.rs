//! Line-based quiz over stdin/stdout, driven by the same session controller
//! the HTTP front-end uses.

use std::io::{self, BufRead, Write};

use quiz_core::model::SelectionDraft;
use services::sessions::Advance;
use services::{QuizError, QuizLoopService, QuizSession};
use storage::repository::ScoreAppend;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PlayError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Quiz(#[from] QuizError),
}

/// How a terminal quiz ended.
#[derive(Debug)]
pub enum PlayOutcome {
    /// The learner quit before the last question.
    Abandoned,
    /// Completed, but no name was given so nothing was stored.
    Unsaved,
    Saved(ScoreAppend),
}

pub struct TerminalQuiz<'a, R, W> {
    quiz: &'a QuizLoopService,
    input: R,
    output: W,
}

enum Step {
    Next,
    Quit,
}

impl<'a, R: BufRead, W: Write> TerminalQuiz<'a, R, W> {
    pub fn new(quiz: &'a QuizLoopService, input: R, output: W) -> Self {
        Self {
            quiz,
            input,
            output,
        }
    }

    /// Run one quiz for `selection`, saving the result under `name` (asked
    /// for when `None`).
    ///
    /// # Errors
    ///
    /// Returns `PlayError::Quiz` if the selection is invalid or has no
    /// questions or saving fails, and `PlayError::Io` on terminal errors.
    pub async fn run(
        &mut self,
        selection: &SelectionDraft,
        name: Option<String>,
    ) -> Result<PlayOutcome, PlayError> {
        let mut session = self.quiz.start(selection)?;
        writeln!(
            self.output,
            "{} questions. Answer with the option number, `q` to quit.",
            session.total_questions()
        )?;

        loop {
            match self.ask_current(&mut session).await? {
                Step::Quit => return Ok(PlayOutcome::Abandoned),
                Step::Next => {
                    if self.quiz.advance(&mut session)? == Advance::Completed {
                        break;
                    }
                }
            }
        }

        if let Some(result) = session.result() {
            writeln!(
                self.output,
                "\nYou scored {}/{} ({}%): {}",
                result.score, result.total, result.percentage, result.remark
            )?;
        }

        let name = match name {
            Some(name) => name,
            None => self.prompt("Your name (blank to skip saving): ")?.unwrap_or_default(),
        };
        if name.trim().is_empty() {
            return Ok(PlayOutcome::Unsaved);
        }
        let outcome = self.quiz.finish(&session, &name).await?;
        writeln!(self.output, "Saved.")?;
        Ok(PlayOutcome::Saved(outcome))
    }

    async fn ask_current(&mut self, session: &mut QuizSession) -> Result<Step, PlayError> {
        let Some(question) = session.current_question() else {
            return Ok(Step::Next);
        };
        let progress = session.progress();
        writeln!(
            self.output,
            "\nQuestion {}/{}: {}",
            progress.position,
            progress.total,
            question.text()
        )?;
        let options = question.options().to_vec();
        for (i, option) in options.iter().enumerate() {
            writeln!(self.output, "  {}. {option}", i + 1)?;
        }

        loop {
            let Some(line) = self.prompt("> ")? else {
                return Ok(Step::Quit);
            };
            match line.as_str() {
                "q" => return Ok(Step::Quit),
                "s" => return Ok(Step::Next),
                _ => {}
            }
            let Some(option) = pick_option(&options, &line) else {
                writeln!(self.output, "Pick a number between 1 and {}.", options.len())?;
                continue;
            };
            if let Some(feedback) = session.submit_answer(option).map_err(QuizError::from)? {
                writeln!(self.output, "{}", feedback.message)?;
                if !feedback.correct {
                    writeln!(self.output, "Correct answer: {}", feedback.correct_answer)?;
                }
            }
            break;
        }

        if let Some(text) = session.basic_explanation() {
            writeln!(self.output, "Explanation: {text}")?;
        }
        self.after_answer(session).await
    }

    async fn after_answer(&mut self, session: &mut QuizSession) -> Result<Step, PlayError> {
        loop {
            let Some(line) = self.prompt("[Enter] next, [d]eeper, [h]ide, [e]xplain, [q]uit: ")?
            else {
                return Ok(Step::Quit);
            };
            match line.as_str() {
                "" | "n" => return Ok(Step::Next),
                "q" => return Ok(Step::Quit),
                "h" => {
                    session.hide_explanation();
                    writeln!(self.output, "Explanation hidden.")?;
                }
                "e" => {
                    session.show_basic_explanation().map_err(QuizError::from)?;
                    if let Some(text) = session.basic_explanation() {
                        writeln!(self.output, "Explanation: {text}")?;
                    }
                }
                "d" => {
                    if let Err(err) = self.quiz.deepen(session).await {
                        debug!(error = %err, "deeper explanation unavailable");
                        writeln!(self.output, "{err}")?;
                        continue;
                    }
                    if let Some(message) = session.explanation_error() {
                        writeln!(self.output, "{message}")?;
                    }
                    if let Some(text) = session.deep_explanation() {
                        writeln!(self.output, "Deeper explanation: {text}")?;
                    }
                }
                other => writeln!(self.output, "Unknown command {other:?}.")?,
            }
        }
    }

    /// Read one trimmed line; `None` at end of input.
    fn prompt(&mut self, label: &str) -> io::Result<Option<String>> {
        write!(self.output, "{label}")?;
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_owned()))
    }
}

/// Resolve a 1-based option number or the option's exact text.
fn pick_option<'o>(options: &'o [String], raw: &str) -> Option<&'o str> {
    if let Ok(n) = raw.parse::<usize>() {
        return n.checked_sub(1).and_then(|i| options.get(i)).map(String::as_str);
    }
    options
        .iter()
        .find(|option| option.eq_ignore_ascii_case(raw))
        .map(String::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_resolve_by_number_or_text() {
        let options = vec!["Lagos".to_string(), "Abuja".to_string()];
        assert_eq!(pick_option(&options, "2"), Some("Abuja"));
        assert_eq!(pick_option(&options, "lagos"), Some("Lagos"));
        assert_eq!(pick_option(&options, "0"), None);
        assert_eq!(pick_option(&options, "3"), None);
        assert_eq!(pick_option(&options, "Kano"), None);
    }
}
