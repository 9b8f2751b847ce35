pub mod adaptive;
pub mod c_api;
pub mod constants;
pub mod distribute;
pub mod helpers;
pub mod morton;
pub mod octree;
pub mod regular;