use crate::input::InputError;
use std::rc::Rc;
use web_sys::HtmlInputElement;
use yew::prelude::*;

/// Holds the state and callbacks for a validated input field.
#[derive(Clone)]
pub struct ValidatedInput<T: Clone + PartialEq + 'static> {
    /// The current text content of the input field.
    pub text: String,
    /// The last successfully parsed value.
    pub value: T,
    pub error: Option<String>,
    /// Callback for the text input's `oninput` event.
    pub on_text_input: Callback<InputEvent>,
    /// Parse the current text; typically wired to `onchange` or Enter.
    pub on_commit: Callback<()>,
    /// Set the value programmatically, rewriting the text and clearing errors.
    pub set_value: Callback<T>,
}

impl<T: Clone + PartialEq + 'static> ValidatedInput<T> {
    /// Parse the text as it is right now, without waiting for a commit.
    ///
    /// Form submission reads fields through this so a value typed without
    /// leaving the field is not lost.
    pub fn current(&self, parse: &dyn Fn(&str) -> Result<T, InputError>) -> Result<T, InputError> {
        parse(&self.text)
    }
}

/// Custom hook to manage state for a validated input field.
///
/// `format` renders a value back into the canonical text shown in the field.
#[hook]
pub fn use_validated_input<T: Clone + PartialEq + 'static>(
    initial_value: T,
    parse: Rc<dyn Fn(&str) -> Result<T, InputError>>,
    format: fn(&T) -> String,
) -> ValidatedInput<T> {
    let value_handle: UseStateHandle<T> = use_state(|| initial_value.clone());
    let text_handle: UseStateHandle<String> = use_state(|| format(&initial_value));
    let error_handle: UseStateHandle<Option<String>> = use_state(|| None::<String>);

    let on_text_input = {
        let text_setter = text_handle.clone();
        Callback::from(move |e: InputEvent| {
            let input: HtmlInputElement = e.target_unchecked_into();
            text_setter.set(input.value());
        })
    };

    let on_commit = {
        let text = text_handle.clone();
        let value_setter = value_handle.clone();
        let error_setter = error_handle.clone();
        Callback::from(move |_| match parse(&text) {
            Ok(parsed) => {
                text.set(format(&parsed));
                value_setter.set(parsed);
                error_setter.set(None);
            }
            Err(e) => error_setter.set(Some(e.to_string())),
        })
    };

    let set_value = {
        let value_setter = value_handle.clone();
        let text_setter = text_handle.clone();
        let error_setter = error_handle.clone();
        Callback::from(move |new_val: T| {
            text_setter.set(format(&new_val));
            value_setter.set(new_val);
            error_setter.set(None);
        })
    };

    ValidatedInput {
        text: (*text_handle).clone(),
        value: (*value_handle).clone(),
        error: (*error_handle).clone(),
        on_text_input,
        on_commit,
        set_value,
    }
}

/// Submit `on_commit` when Enter is pressed.
pub fn commit_on_enter(on_commit: &Callback<()>) -> Callback<KeyboardEvent> {
    let on_commit = on_commit.clone();
    Callback::from(move |e: KeyboardEvent| {
        if e.key() == "Enter" {
            on_commit.emit(());
        }
    })
}
