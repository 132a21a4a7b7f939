//! Export of compiled task graphs to graphviz `dot` format.

use std::fmt::{Display, Formatter};

use anyhow::Result;
use petgraph::dot::{Config, Dot};
use petgraph::graph::NodeIndex;
use petgraph::Graph;

use crate::command_buffer::traits::CommandStream;
use crate::graph::task_graph::TaskGraph;
use crate::sync::barrier::Barrier;

/// Exports a graph to a graphviz-compatible format.
pub trait GraphViz {
    /// Get the string representation of this graph in `dot` format.
    fn dot(&self) -> Result<String>;
}

enum VizNode {
    Task(String),
    Barriers(Vec<Barrier>),
}

impl Display for VizNode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            VizNode::Task(name) => f.write_fmt(format_args!("Task: {name}")),
            VizNode::Barriers(barriers) => {
                for barrier in barriers {
                    let layouts = match barrier {
                        Barrier::Image(image) => format!(" ({:?} => {:?})", image.old_layout, image.new_layout),
                        _ => String::new(),
                    };
                    f.write_fmt(format_args!(
                        "{:?}: {:?} => {:?}{layouts}\n",
                        barrier.resource(),
                        barrier.src().stage,
                        barrier.dst().stage
                    ))?;
                }
                Ok(())
            }
        }
    }
}

impl<S: CommandStream + ?Sized> GraphViz for TaskGraph<'_, S> {
    fn dot(&self) -> Result<String> {
        let mut graph = Graph::<VizNode, String>::new();
        let mut last_nodes: Vec<Vec<NodeIndex>> = Vec::with_capacity(self.groups().len());

        for group in self.groups() {
            let sources: Vec<NodeIndex> = group.prev().map(|prev| last_nodes[prev.index()].clone()).unwrap_or_default();

            let entry = (!group.barriers().is_empty()).then(|| graph.add_node(VizNode::Barriers(group.barriers().to_vec())));
            let mut tails = Vec::new();
            for task in group.tasks() {
                let name = self.task(*task).map(|task| task.name().to_owned()).unwrap_or_default();
                let node = graph.add_node(VizNode::Task(name));
                match entry {
                    Some(entry) => {
                        graph.add_edge(entry, node, String::new());
                    }
                    None => sources.iter().for_each(|source| {
                        graph.add_edge(*source, node, String::new());
                    }),
                }
                tails.push(node);
            }
            if let Some(entry) = entry {
                sources.iter().for_each(|source| {
                    graph.add_edge(*source, entry, String::new());
                });
            }

            if !group.exit_barriers().is_empty() {
                let exit = graph.add_node(VizNode::Barriers(group.exit_barriers().to_vec()));
                tails.iter().for_each(|tail| {
                    graph.add_edge(*tail, exit, String::new());
                });
                tails = vec![exit];
            }
            last_nodes.push(tails);
        }

        Ok(format!(
            "{}",
            Dot::with_attr_getters(
                &graph,
                &[Config::EdgeNoLabel],
                &|_, _| String::new(),
                &|_, (_, node)| match node {
                    VizNode::Task(_) => String::from("fillcolor = \"#5e6df7\""),
                    VizNode::Barriers(_) => String::from("fillcolor = \"#f75e70\" shape=box"),
                }
            )
        ))
    }
}
