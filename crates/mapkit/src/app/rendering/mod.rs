mod renderer;
mod tiles;

pub(crate) use renderer::Renderer;
