//! Dialog adapters: a queue of canned answers, and a stdin prompt.

use std::cell::RefCell;
use std::collections::VecDeque;

use futures::future::{FutureExt, LocalBoxFuture};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use crate::kernel::services::ports::{ConfirmChoice, ConfirmOptions, DialogService};

/// Answers from a queue, then with a fixed fallback. Records every prompt.
pub struct ScriptedDialog {
    answers: RefCell<VecDeque<ConfirmChoice>>,
    fallback: ConfirmChoice,
    prompts: RefCell<Vec<ConfirmOptions>>,
}

impl ScriptedDialog {
    pub fn new<I>(answers: I, fallback: ConfirmChoice) -> Self
    where
        I: IntoIterator<Item = ConfirmChoice>,
    {
        Self {
            answers: RefCell::new(answers.into_iter().collect()),
            fallback,
            prompts: RefCell::new(Vec::new()),
        }
    }

    pub fn always(choice: ConfirmChoice) -> Self {
        Self::new([], choice)
    }

    pub fn push_answer(&self, choice: ConfirmChoice) {
        self.answers.borrow_mut().push_back(choice);
    }

    pub fn prompt_count(&self) -> usize {
        self.prompts.borrow().len()
    }

    pub fn prompts(&self) -> Vec<ConfirmOptions> {
        self.prompts.borrow().clone()
    }
}

impl DialogService for ScriptedDialog {
    fn confirm<'a>(&'a self, options: &'a ConfirmOptions) -> LocalBoxFuture<'a, ConfirmChoice> {
        async move {
            self.prompts.borrow_mut().push(options.clone());
            tokio::task::yield_now().await;
            self.answers
                .borrow_mut()
                .pop_front()
                .unwrap_or(self.fallback)
        }
        .boxed_local()
    }
}

/// Asks on the terminal. An empty line picks the default button, end of input
/// picks the cancel button.
#[derive(Debug, Default)]
pub struct PromptDialog;

impl PromptDialog {
    pub fn new() -> Self {
        Self
    }
}

impl DialogService for PromptDialog {
    fn confirm<'a>(&'a self, options: &'a ConfirmOptions) -> LocalBoxFuture<'a, ConfirmChoice> {
        async move {
            let labels: Vec<&str> = options.buttons.iter().map(|b| b.label.as_str()).collect();
            let question = format!(
                "{}\n{} [{}] (default: {}) ",
                options.title,
                options.message,
                labels.join(" / "),
                options.default_button
            );

            let mut stdout = tokio::io::stdout();
            let mut stdin = BufReader::new(tokio::io::stdin());
            loop {
                if stdout.write_all(question.as_bytes()).await.is_err()
                    || stdout.flush().await.is_err()
                {
                    return options.cancel_choice();
                }

                let mut line = String::new();
                match stdin.read_line(&mut line).await {
                    Ok(0) | Err(_) => return options.cancel_choice(),
                    Ok(_) => {}
                }
                if line.trim().is_empty() {
                    return options.default_choice();
                }
                if let Some(choice) = options.choice_for_label(&line) {
                    return choice;
                }
            }
        }
        .boxed_local()
    }
}
