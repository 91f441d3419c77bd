use super::*;

mod event_dispatch_and_listeners;
mod harness_actions_and_assertions;
mod html_parser_and_dom_tree;
