//! Graph Layout Pipeline
//!
//! This module connects the state tree to the layout engine.
//!
//! # Overview
//!
//! - [`graph_input`] projects the state into a [`GraphInput`], the minimal
//!   value the layout depends on.
//! - A [`LayoutEngine`] turns that input into a [`ComputedGraph`].
//! - The [`GraphComputeDispatcher`] runs engines on a background worker and
//!   writes results back through the store.
//!
//! # Design Decisions
//!
//! 1. The engine never sees the store. It gets an owned input and returns an
//!    owned result, so it can run on any thread.
//!
//! 2. Results re-enter the state only through a dispatch, like any other
//!    change.
//!
//! 3. The computed graph is replaced as a whole on every accepted result.

mod dispatcher;
mod input;
mod layout;

pub use dispatcher::GraphComputeDispatcher;
pub use input::{
    graph_input, GraphInput, InputEdge, InputNode, LABEL_CHAR_WIDTH, NODE_BASE_WIDTH, NODE_HEIGHT,
};
pub use layout::{
    ComputedGraph, GraphSize, LayerBand, LayeredLayout, LayoutEngine, Point, PositionedEdge,
    PositionedNode,
};
