//! Algorithms for distributed octrees.
//!
//! Steps:
//! ------
//! 0) Distribute points evenly over all nodes (just a placeholder for now)
//! 1) Create local tree on each MPI node.
//! 2) Perform HykSort and remove overlaps on each node - Unbalanced Tree.


