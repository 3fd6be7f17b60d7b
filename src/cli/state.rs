use crossterm::event::{KeyCode, KeyEvent, KeyEventKind};
use ratatui::widgets::ListState;

use crate::cli::input::LineEdit;
use crate::cli::util::{fmt_money, parse_amount, parse_months};
use crate::error::GoalError;
use crate::store::{Goal, GoalStore, KeyValueStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Goals,
    Income,
    Help,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormField {
    #[default]
    Name,
    Target,
    Months,
}

impl FormField {
    fn next(self) -> Self {
        match self {
            Self::Name => Self::Target,
            Self::Target => Self::Months,
            Self::Months => Self::Name,
        }
    }

    fn prev(self) -> Self {
        match self {
            Self::Name => Self::Months,
            Self::Target => Self::Name,
            Self::Months => Self::Target,
        }
    }
}

/// Modal add/edit form. `editing_id` is set when an existing goal is
/// being reshaped.
#[derive(Debug, Default, Clone)]
pub struct GoalForm {
    pub name: LineEdit,
    pub target: LineEdit,
    pub months: LineEdit,
    pub focus: FormField,
    pub editing_id: Option<String>,
    pub error: Option<String>,
}

pub struct App<S: KeyValueStore> {
    pub store: GoalStore<S>,
    pub tab: Tab,
    pub goal_sel: ListState,
    pub form: Option<GoalForm>,
    pub income_input: LineEdit,
    pub status: String,
    pub quit: bool,
}

impl<S: KeyValueStore> App<S> {
    pub fn new(store: GoalStore<S>) -> Self {
        let mut goal_sel = ListState::default();
        if !store.goals().is_empty() {
            goal_sel.select(Some(0));
        }
        Self {
            store,
            tab: Tab::Goals,
            goal_sel,
            form: None,
            income_input: LineEdit::default(),
            status: "Press ? for help | q to quit".into(),
            quit: false,
        }
    }

    pub fn selected_goal(&self) -> Option<&Goal> {
        let idx = self.goal_sel.selected()?;
        self.store.goals().get(idx)
    }

    fn move_goal(&mut self, delta: isize) {
        let n = self.store.goals().len();
        if n == 0 {
            self.goal_sel.select(None);
            return;
        }
        let cur = self.goal_sel.selected().unwrap_or(0) as isize;
        let next = (cur + delta).rem_euclid(n as isize) as usize;
        self.goal_sel.select(Some(next));
    }

    pub async fn handle_key(&mut self, k: KeyEvent) -> anyhow::Result<()> {
        if k.kind != KeyEventKind::Press {
            return Ok(());
        }
        if self.form.is_some() {
            self.handle_form_input(k).await;
            return Ok(());
        }

        match k.code {
            KeyCode::Char('q') => {
                self.quit = true;
                return Ok(());
            }
            KeyCode::Char('?') => {
                self.tab = Tab::Help;
                return Ok(());
            }
            KeyCode::Char('t') => {
                match self.store.toggle_theme().await {
                    Ok(theme) => self.status = format!("Theme: {}", theme.as_str()),
                    Err(err) => self.status = format!("Theme not saved: {err}"),
                }
                return Ok(());
            }
            KeyCode::Tab => {
                self.tab = match self.tab {
                    Tab::Goals => Tab::Income,
                    Tab::Income => Tab::Goals,
                    Tab::Help => Tab::Goals,
                };
                return Ok(());
            }
            _ => {}
        }

        match self.tab {
            Tab::Goals => match k.code {
                KeyCode::Up => self.move_goal(-1),
                KeyCode::Down => self.move_goal(1),
                KeyCode::Char('n') => self.form = Some(GoalForm::default()),
                KeyCode::Char('e') => self.open_edit_form(),
                KeyCode::Char('x') | KeyCode::Delete => self.delete_selected().await,
                _ => {}
            },
            Tab::Income => match k.code {
                KeyCode::Char(c) if c.is_ascii_digit() || c == '.' => self.income_input.push(c),
                KeyCode::Backspace => self.income_input.backspace(),
                KeyCode::Enter => self.submit_income().await,
                _ => {}
            },
            Tab::Help => match k.code {
                KeyCode::Esc | KeyCode::Char('b') => self.tab = Tab::Goals,
                _ => {}
            },
        }
        Ok(())
    }

    fn open_edit_form(&mut self) {
        let Some(goal) = self.selected_goal() else {
            self.status = "No goal selected".into();
            return;
        };
        let mut form = GoalForm {
            editing_id: Some(goal.id.clone()),
            ..GoalForm::default()
        };
        form.name.set(goal.name.clone());
        form.target.set(goal.target_amount.to_string());
        form.months.set(goal.time_frame.to_string());
        self.form = Some(form);
    }

    async fn delete_selected(&mut self) {
        let Some(goal) = self.selected_goal() else {
            self.status = "No goal selected".into();
            return;
        };
        let id = goal.id.clone();
        let name = goal.name.clone();
        match self.store.delete_goal(&id).await {
            Ok(_) => self.status = format!("Deleted \"{name}\"."),
            Err(err) => self.status = format!("Deleted \"{name}\", but: {err}"),
        }
        let n = self.store.goals().len();
        if n == 0 {
            self.goal_sel.select(None);
        } else if self.goal_sel.selected().is_some_and(|i| i >= n) {
            self.goal_sel.select(Some(n - 1));
        }
    }

    async fn handle_form_input(&mut self, k: KeyEvent) {
        match k.code {
            KeyCode::Esc => {
                self.form = None;
                return;
            }
            KeyCode::Enter => {
                self.submit_form().await;
                return;
            }
            _ => {}
        }
        let Some(form) = self.form.as_mut() else {
            return;
        };
        match k.code {
            KeyCode::Tab | KeyCode::Down => form.focus = form.focus.next(),
            KeyCode::BackTab | KeyCode::Up => form.focus = form.focus.prev(),
            KeyCode::Char(c) => match form.focus {
                FormField::Name => form.name.push(c),
                FormField::Target if c.is_ascii_digit() || c == '.' => form.target.push(c),
                FormField::Months if c.is_ascii_digit() => form.months.push(c),
                _ => {}
            },
            KeyCode::Backspace => match form.focus {
                FormField::Name => form.name.backspace(),
                FormField::Target => form.target.backspace(),
                FormField::Months => form.months.backspace(),
            },
            _ => {}
        }
    }

    async fn submit_form(&mut self) {
        let (name, target_text, months_text, editing_id) = match &self.form {
            Some(form) => (
                form.name.as_str().to_string(),
                form.target.as_str().to_string(),
                form.months.as_str().to_string(),
                form.editing_id.clone(),
            ),
            None => return,
        };

        let Some(target) = parse_amount(&target_text) else {
            self.set_form_error("Target must be a positive number");
            return;
        };
        let Some(months) = parse_months(&months_text) else {
            self.set_form_error("Months must be a positive whole number");
            return;
        };

        let result = match &editing_id {
            Some(id) => self.store.edit_goal(id, &name, target, months).await,
            None => self.store.add_goal(&name, target, months).await,
        };

        match result {
            Ok(_) => {
                self.status = if editing_id.is_some() {
                    "Goal updated.".into()
                } else {
                    "Goal added.".into()
                };
                self.form = None;
                if self.goal_sel.selected().is_none() && !self.store.goals().is_empty() {
                    self.goal_sel.select(Some(0));
                }
            }
            // Mutation applied, only durability failed: close the form but
            // tell the user.
            Err(err @ GoalError::Persistence(_)) => {
                self.status = format!("Saved in memory, not on disk: {err}");
                self.form = None;
            }
            Err(err) => self.set_form_error(&err.to_string()),
        }
    }

    fn set_form_error(&mut self, message: &str) {
        if let Some(form) = self.form.as_mut() {
            form.error = Some(message.to_string());
        }
    }

    async fn submit_income(&mut self) {
        let text = self.income_input.as_str().trim().to_string();
        let value = text.parse::<f64>().unwrap_or(f64::NAN);
        match self.store.set_income(value).await {
            Ok(snapshot) => {
                self.status = format!("Monthly income set to {}.", fmt_money(snapshot.income));
                self.income_input.clear();
            }
            Err(err @ GoalError::Persistence(_)) => {
                self.status = format!("Income updated, not on disk: {err}");
                self.income_input.clear();
            }
            Err(err) => self.status = err.to_string(),
        }
    }
}
