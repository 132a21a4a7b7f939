use crate::sync::batcher::BarrierBatch;

/// The recording boundary. Anything barriers and pass commands can be recorded into implements this trait, usually
/// an [`IncompleteCommandBuffer`](crate::command_buffer::IncompleteCommandBuffer).
pub trait CommandStream {
    /// Record one batched pipeline barrier. Equivalent of `vkCmdPipelineBarrier2`.
    fn pipeline_barrier(&mut self, batch: &BarrierBatch<'_>);

    /// Open a debug label region. Does nothing unless the stream supports debug labels.
    fn begin_label(&mut self, _name: &str, _color: [f32; 4]) {}

    /// Close the last opened debug label region.
    fn end_label(&mut self) {}
}
