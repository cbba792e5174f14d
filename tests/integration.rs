//! End-to-end scenarios driving `Story`/`RuntimeGraph` against hand-built
//! documents in this crate's tagged-JSON wire format (no compiled-ink
//! reference corpus is available, so these stand in for the named
//! scenarios rather than reproducing byte-exact reference transcripts).

use std::cell::RefCell;
use std::rc::Rc;

use ink_runtime::{RuntimeGraph, SessionError, Story};
use serde_json::json;

fn load(root: serde_json::Value) -> RuntimeGraph {
    let document = json!({
        "inkVersion": 21,
        "root": root,
    });
    RuntimeGraph::from_json_value(document).expect("document should load")
}

/// `B001`: a story with no choices at all, none taken, text matches exactly.
#[test]
fn b001_linear_story_matches_exact_transcript() {
    let graph = load(json!(["^Hello, world!\n", null]));
    let mut story = Story::new(graph);

    let text = story.continue_maximally().unwrap();

    assert_eq!(text, "Hello, world!\n");
    assert!(!story.can_continue());
    assert!(story.current_choices().is_empty());
}

/// `B005`: a single choice point, choice `[0]` taken, single-branch follow.
#[test]
fn b005_single_choice_follows_the_selected_branch() {
    let graph = load(json!([
        "^Before the choice.\n",
        {"*": "choice0", "flg": 0},
        "done",
        {"choice0": ["^You chose yes.\n", null]},
    ]));
    let mut story = Story::new(graph);

    let opening = story.continue_maximally().unwrap();
    assert_eq!(opening, "Before the choice.\n");
    assert_eq!(story.current_choices().len(), 1);
    assert_eq!(story.current_choices()[0].text, "Before the choice.\n");

    story.choose_choice(0).unwrap();
    let follow_up = story.continue_maximally().unwrap();

    assert_eq!(follow_up, "You chose yes.\n");
    assert!(!story.can_continue());
}

/// `fogg`: a multi-turn sequence, `[0, 1]`, verifying choice selection
/// carries correctly across two separate decision points.
#[test]
fn fogg_style_multi_turn_choice_sequence() {
    let graph = load(json!([
        "^Turn one.\n",
        {"*": "opt0", "flg": 0},
        "done",
        {
            "opt0": [
                "^You picked first.\n",
                {"*": "opt1", "flg": 0},
                {"*": "opt2", "flg": 0},
                "done",
                {
                    "opt1": ["^You picked second (opt1).\n", null],
                    "opt2": ["^You picked second (opt2).\n", null],
                },
            ],
        },
    ]));
    let mut story = Story::new(graph);

    story.continue_maximally().unwrap();
    assert_eq!(story.current_choices().len(), 1);
    story.choose_choice(0).unwrap();

    let second_turn = story.continue_maximally().unwrap();
    assert_eq!(second_turn, "You picked first.\n");
    assert_eq!(story.current_choices().len(), 2);

    story.choose_choice(1).unwrap();
    let ending = story.continue_maximally().unwrap();

    assert_eq!(ending, "You picked second (opt2).\n");
    assert!(!story.can_continue());
}

/// `knot_test`: a tunnel divert into a named knot, returning via `->->`,
/// verifying the callstack restores the caller's pointer.
#[test]
fn knot_test_tunnel_divert_and_return() {
    let graph = load(json!([
        "^Start.\n",
        {"->": "knotA", "tun": true},
        "^Back in root.\n",
        {"knotA": ["^Inside knot.\n", "->->", null]},
    ]));
    let mut story = Story::new(graph);

    let text = story.continue_maximally().unwrap();

    assert_eq!(text, "Start.\nInside knot.\nBack in root.\n");
    assert!(!story.can_continue());
}

/// `external_functions`: external calls are dispatched in the order the
/// diverting content runs, with the arguments already evaluated onto the
/// stack at the point of the call.
#[test]
fn external_functions_trace_matches_expected_call_order() {
    let graph = load(json!([
        "^Before call.\n",
        "ev", 100, "/ev",
        {"->": "onSuccess", "x": true, "exArgs": 1},
        {"->": "onDialogueEnd", "x": true, "exArgs": 0},
        "^After calls.\n",
        null,
    ]));
    let mut story = Story::new(graph);

    let trace = Rc::new(RefCell::new(Vec::new()));

    let success_trace = trace.clone();
    story.bind_external(
        "onSuccess",
        true,
        Box::new(move |args| {
            success_trace
                .borrow_mut()
                .push(format!("onSuccess + [{:?}]", args));
            ink_runtime::VariableValue::Int(0)
        }),
    );

    let end_trace = trace.clone();
    story.bind_external(
        "onDialogueEnd",
        true,
        Box::new(move |_| {
            end_trace.borrow_mut().push("onDialogueEnd".to_string());
            ink_runtime::VariableValue::Int(0)
        }),
    );

    let text = story.continue_maximally().unwrap();

    assert_eq!(text, "Before call.\nAfter calls.\n");
    assert_eq!(
        *trace.borrow(),
        vec!["onSuccess + [[Int(100)]]".to_string(), "onDialogueEnd".to_string()]
    );
}

/// Invariant 1: reading `current_text` after each individual
/// `continue_one_line`/`choose_choice` call and concatenating it matches
/// what a single `continue_maximally` over the same choices produces.
#[test]
fn current_text_concatenation_matches_continue_maximally() {
    let make_graph = || {
        load(json!([
            "^Line one.\n",
            "^Line two.\n",
            null,
        ]))
    };

    let mut piecewise = Story::new(make_graph());
    let mut accumulated = String::new();
    while piecewise.can_continue() {
        piecewise.continue_one_line().unwrap();
        accumulated.push_str(&piecewise.current_text());
    }

    let mut maximal = Story::new(make_graph());
    let all_at_once = maximal.continue_maximally().unwrap();

    assert_eq!(accumulated, all_at_once);
}

/// Invariant 2: after `reset_state`, globals are empty again and the
/// pointer is back at the root, so stepping reproduces the opening text.
#[test]
fn reset_state_returns_to_a_fresh_root_pointer() {
    let graph = load(json!(["^Hello.\n", null]));
    let mut story = Story::new(graph);

    story.continue_maximally().unwrap();
    assert!(!story.can_continue());

    story.reset_state();

    assert!(story.state().variables.all_globals().is_empty());
    assert_eq!(story.state().visit_counts.all_visits().len(), 0);
    let text = story.continue_maximally().unwrap();
    assert_eq!(text, "Hello.\n");
}

/// Boundary: `choose_choice` past the end of `current_choices` fails with
/// `out-of-range-choice` rather than panicking.
#[test]
fn choosing_an_out_of_range_choice_index_errors() {
    let graph = load(json!([
        "^Pick one.\n",
        {"*": "only", "flg": 0},
        "done",
        {"only": ["^Only option.\n", null]},
    ]));
    let mut story = Story::new(graph);
    story.continue_maximally().unwrap();

    let result = story.choose_choice(1);

    assert_eq!(result, Err(SessionError::OutOfRangeChoice { index: 1, count: 1 }));
}

/// Boundary: a decision point where every generated choice is an
/// invisible default auto-advances instead of surfacing an empty prompt.
#[test]
fn invisible_default_choice_auto_advances() {
    let graph = load(json!([
        "^Before.\n",
        {"*": "fallback", "flg": 0x8},
        "done",
        {"fallback": ["^Auto-followed.\n", null]},
    ]));
    let mut story = Story::new(graph);

    let text = story.continue_maximally().unwrap();

    assert_eq!(text, "Before.\nAuto-followed.\n");
    assert!(story.current_choices().is_empty());
    assert!(!story.can_continue());
}
