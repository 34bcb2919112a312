pub mod galleries;
